//! Annotation page storage

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::model::Page;

/// Storage for annotation pages
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Page by dataset, local and page id
    async fn fetch_page(&self, dataset_id: &str, local_id: &str, page_id: &str) -> Result<Option<Page>>;

    /// The page containing the given annotation
    async fn fetch_annotation_page(
        &self,
        dataset_id: &str,
        local_id: &str,
        annotation_id: &str,
    ) -> Result<Option<Page>>;

    /// Insert or replace a page together with its annotation index
    async fn save_page(&self, page: &Page) -> Result<()>;

    /// Remove every page of a dataset, returning the number of pages deleted
    async fn delete_dataset(&self, dataset_id: &str) -> Result<u64>;

    async fn count_pages(&self) -> Result<u64>;
}

#[derive(Debug, sqlx::FromRow)]
struct PageRow {
    document: String,
}

impl PageRow {
    fn into_page(self) -> Result<Page> {
        Ok(serde_json::from_str(&self.document)?)
    }
}

/// SQLite page repository
#[derive(Clone)]
pub struct SqlitePageRepository {
    pool: SqlitePool,
}

impl SqlitePageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PageRepository for SqlitePageRepository {
    async fn fetch_page(&self, dataset_id: &str, local_id: &str, page_id: &str) -> Result<Option<Page>> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            SELECT document
            FROM annopages
            WHERE dataset_id = ? AND local_id = ? AND page_id = ?
            "#,
        )
        .bind(dataset_id)
        .bind(local_id)
        .bind(page_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PageRow::into_page).transpose()
    }

    async fn fetch_annotation_page(
        &self,
        dataset_id: &str,
        local_id: &str,
        annotation_id: &str,
    ) -> Result<Option<Page>> {
        let row = sqlx::query_as::<_, PageRow>(
            r#"
            SELECT p.document
            FROM annotations a
            JOIN annopages p
              ON p.dataset_id = a.dataset_id
             AND p.local_id = a.local_id
             AND p.page_id = a.page_id
            WHERE a.dataset_id = ? AND a.local_id = ? AND a.annotation_id = ?
            "#,
        )
        .bind(dataset_id)
        .bind(local_id)
        .bind(annotation_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PageRow::into_page).transpose()
    }

    async fn save_page(&self, page: &Page) -> Result<()> {
        let document = serde_json::to_string(page)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO annopages
                (dataset_id, local_id, page_id, target_id, resource_id, modified, document)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&page.dataset_id)
        .bind(&page.local_id)
        .bind(&page.page_id)
        .bind(&page.target_id)
        .bind(&page.resource.id)
        .bind(page.modified.to_rfc3339())
        .bind(&document)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM annotations WHERE dataset_id = ? AND local_id = ? AND page_id = ?")
            .bind(&page.dataset_id)
            .bind(&page.local_id)
            .bind(&page.page_id)
            .execute(&mut *tx)
            .await?;

        for annotation in &page.annotations {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO annotations
                    (dataset_id, local_id, annotation_id, page_id, annotation_type)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&page.dataset_id)
            .bind(&page.local_id)
            .bind(&annotation.id)
            .bind(&page.page_id)
            .bind(annotation.annotation_type.code().to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_dataset(&self, dataset_id: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM annotations WHERE dataset_id = ?")
            .bind(dataset_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM annopages WHERE dataset_id = ?")
            .bind(dataset_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted)
    }

    async fn count_pages(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM annopages")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::create_pool;
    use crate::model::{Annotation, AnnotationType, Target, TextResource};
    use chrono::{TimeZone, Utc};

    async fn repository() -> SqlitePageRepository {
        let pool = create_pool(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap();
        SqlitePageRepository::new(pool)
    }

    fn page(dataset_id: &str, page_id: &str, annotation_ids: &[&str]) -> Page {
        Page {
            dataset_id: dataset_id.to_string(),
            local_id: "lc1".to_string(),
            page_id: page_id.to_string(),
            target_id: format!("https://iiif.europeana.eu/image/{}/lc1/{}", dataset_id, page_id),
            modified: Utc.with_ymd_and_hms(2018, 10, 18, 12, 0, 0).unwrap(),
            resource: TextResource {
                id: "ft1".to_string(),
                dataset_id: dataset_id.to_string(),
                local_id: "lc1".to_string(),
                language: Some("en".to_string()),
                value: Some("some text".to_string()),
            },
            annotations: annotation_ids
                .iter()
                .map(|id| Annotation {
                    id: id.to_string(),
                    annotation_type: AnnotationType::Word,
                    motivation: None,
                    language: None,
                    text_start: Some(0),
                    text_end: Some(4),
                    targets: vec![Target::new(1, 2, 3, 4)],
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_save_and_fetch_page() {
        let repo = repository().await;
        let saved = page("ds1", "1", &["an1", "an2"]);
        repo.save_page(&saved).await.unwrap();

        let fetched = repo.fetch_page("ds1", "lc1", "1").await.unwrap();
        assert_eq!(fetched, Some(saved));
        assert!(repo.fetch_page("ds1", "lc1", "2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_annotation_page() {
        let repo = repository().await;
        repo.save_page(&page("ds1", "1", &["an1"])).await.unwrap();
        repo.save_page(&page("ds1", "2", &["an2", "an3"])).await.unwrap();

        let found = repo.fetch_annotation_page("ds1", "lc1", "an3").await.unwrap().unwrap();
        assert_eq!(found.page_id, "2");
        assert!(found.annotation("an3").is_some());
        assert!(repo.fetch_annotation_page("ds1", "lc1", "an9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_page() {
        let repo = repository().await;
        repo.save_page(&page("ds1", "1", &["an1", "an2"])).await.unwrap();
        repo.save_page(&page("ds1", "1", &["an3"])).await.unwrap();

        assert_eq!(repo.count_pages().await.unwrap(), 1);
        assert!(repo.fetch_annotation_page("ds1", "lc1", "an1").await.unwrap().is_none());
        assert!(repo.fetch_annotation_page("ds1", "lc1", "an3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_dataset() {
        let repo = repository().await;
        repo.save_page(&page("ds1", "1", &["an1"])).await.unwrap();
        repo.save_page(&page("ds1", "2", &["an2"])).await.unwrap();
        repo.save_page(&page("ds2", "1", &["an1"])).await.unwrap();

        assert_eq!(repo.delete_dataset("ds1").await.unwrap(), 2);
        assert_eq!(repo.count_pages().await.unwrap(), 1);
        assert!(repo.fetch_annotation_page("ds1", "lc1", "an1").await.unwrap().is_none());
        assert!(repo.fetch_page("ds2", "lc1", "1").await.unwrap().is_some());
    }
}

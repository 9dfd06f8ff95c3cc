//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Annotation pages, one row per canvas; the page aggregate is kept as JSON
CREATE TABLE IF NOT EXISTS annopages (
    dataset_id TEXT NOT NULL,
    local_id TEXT NOT NULL,
    page_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    resource_id TEXT NOT NULL,
    modified TEXT NOT NULL,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (dataset_id, local_id, page_id)
);

CREATE INDEX IF NOT EXISTS idx_annopages_dataset ON annopages(dataset_id);

-- Annotation id -> page lookup
CREATE TABLE IF NOT EXISTS annotations (
    dataset_id TEXT NOT NULL,
    local_id TEXT NOT NULL,
    annotation_id TEXT NOT NULL,
    page_id TEXT NOT NULL,
    annotation_type TEXT NOT NULL,
    PRIMARY KEY (dataset_id, local_id, annotation_id)
);

CREATE INDEX IF NOT EXISTS idx_annotations_page ON annotations(dataset_id, local_id, page_id);
"#;

//! Batch ingestion driver
//!
//! Walks a directory tree for `*.xml` fulltext documents, parses them on the
//! blocking thread pool and saves the resulting pages one by one.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinSet;

use super::error::LoaderError;
use super::parser::XmlParser;
use super::progress::{ProgressCounter, ProgressSink};
use crate::db::PageRepository;
use crate::error::AppError;
use crate::model::Page;

/// Errors that stop a whole batch
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Cannot read batch directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save page {key}: {source}")]
    Save {
        key: String,
        #[source]
        source: AppError,
    },

    #[error("Parser task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Summary of one batch run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub files: usize,
    pub files_failed: usize,
    pub pages_saved: usize,
    pub save_failures: usize,
    pub annotations_accepted: usize,
    pub annotations_skipped: usize,
}

/// Parses fulltext documents and stores them in a page repository
pub struct Ingester {
    parser: Arc<XmlParser>,
    repository: Arc<dyn PageRepository>,
    stop_on_save_error: bool,
    batch_size: usize,
}

impl Ingester {
    pub fn new(parser: XmlParser, repository: Arc<dyn PageRepository>, stop_on_save_error: bool) -> Self {
        let batch_size = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            parser: Arc::new(parser),
            repository,
            stop_on_save_error,
            batch_size,
        }
    }

    /// Load every `*.xml` file under `directory`.
    ///
    /// Documents that fail to parse are logged and counted; a failed save
    /// aborts the run only when `stop_on_save_error` is set.
    pub async fn load_directory(&self, directory: &Path) -> Result<LoadReport, IngestError> {
        let files = collect_xml_files(directory).map_err(|source| IngestError::Directory {
            path: directory.to_path_buf(),
            source,
        })?;
        tracing::info!("Found {} xml files in {}", files.len(), directory.display());

        let progress = Arc::new(ProgressCounter::new());
        let pages_before = self.count_pages().await;
        let mut report = LoadReport {
            files: files.len(),
            ..LoadReport::default()
        };

        for batch in files.chunks(self.batch_size) {
            let mut tasks = JoinSet::new();
            for (index, path) in batch.iter().enumerate() {
                let parser = Arc::clone(&self.parser);
                let progress = Arc::clone(&progress);
                let path = path.clone();
                tasks.spawn_blocking(move || {
                    let sink: &dyn ProgressSink = &*progress;
                    let result = parse_path(&parser, &path, Some(sink));
                    (index, path, result)
                });
            }

            // save in directory order
            let mut parsed = Vec::with_capacity(batch.len());
            while let Some(joined) = tasks.join_next().await {
                parsed.push(joined?);
            }
            parsed.sort_by_key(|(index, _, _)| *index);

            for (_, path, result) in parsed {
                match result {
                    Ok(page) => self.save(&page, &mut report).await?,
                    Err(e) => {
                        tracing::error!(file = %path.display(), "Error processing file: {}", e);
                        report.files_failed += 1;
                    }
                }
            }
        }

        report.annotations_accepted = progress.accepted();
        report.annotations_skipped = progress.skipped();

        if let (Some(before), Some(after)) = (pages_before, self.count_pages().await) {
            let added = after.saturating_sub(before);
            if added != report.pages_saved as u64 {
                tracing::warn!(
                    "Saved {} pages but the page count grew by {} (existing pages were replaced)",
                    report.pages_saved,
                    added
                );
            }
        }

        tracing::info!(
            "Batch finished: {} files, {} pages saved, {} files failed, {} annotations skipped",
            report.files,
            report.pages_saved,
            report.files_failed,
            report.annotations_skipped
        );
        Ok(report)
    }

    async fn save(&self, page: &Page, report: &mut LoadReport) -> Result<(), IngestError> {
        match self.repository.save_page(page).await {
            Ok(()) => {
                tracing::debug!(page = %page.key(), "Saved page");
                report.pages_saved += 1;
                Ok(())
            }
            Err(source) if self.stop_on_save_error => Err(IngestError::Save {
                key: page.key(),
                source,
            }),
            Err(e) => {
                tracing::error!(page = %page.key(), "Error saving page: {}", e);
                report.save_failures += 1;
                Ok(())
            }
        }
    }

    async fn count_pages(&self) -> Option<u64> {
        match self.repository.count_pages().await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("Cannot count pages: {}", e);
                None
            }
        }
    }
}

/// Parse one document from disk.
///
/// The page id is the file stem; the file's modification time becomes the
/// page's last-modified timestamp.
pub fn parse_path(
    parser: &XmlParser,
    path: &Path,
    progress: Option<&dyn ProgressSink>,
) -> Result<Page, LoaderError> {
    let page_id = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = File::open(path)?;
    let modified: DateTime<Utc> = file.metadata()?.modified()?.into();

    parser.parse(
        &page_id,
        BufReader::new(file),
        &path.display().to_string(),
        Some(modified),
        progress,
    )
}

/// Recursively collect `*.xml` files, sorted by path
fn collect_xml_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![directory.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            // symlinked directories are not followed
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

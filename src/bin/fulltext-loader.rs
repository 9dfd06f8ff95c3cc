//! Fulltext batch loader
//!
//! Usage:
//!
//! ```text
//! fulltext-loader [DIRECTORY]                 load every *.xml file under DIRECTORY
//! fulltext-loader --delete-dataset DATASET    remove all pages of a dataset
//! ```
//!
//! Without a directory argument `BATCH_BASE_DIRECTORY` is used.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fulltext_server::config::Config;
use fulltext_server::db::{self, PageRepository, SqlitePageRepository};
use fulltext_server::loader::{Ingester, ParserSettings, XmlParser};

enum Command {
    Load(Option<PathBuf>),
    DeleteDataset(String),
}

fn parse_args() -> anyhow::Result<Command> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(Command::Load(None)),
        Some("--delete-dataset") => match args.next() {
            Some(dataset_id) => Ok(Command::DeleteDataset(dataset_id)),
            None => bail!("--delete-dataset needs a dataset id"),
        },
        Some(directory) => Ok(Command::Load(Some(PathBuf::from(directory)))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fulltext_server=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();

    let command = parse_args()?;

    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to initialize database")?;
    let pages = Arc::new(SqlitePageRepository::new(db_pool));

    match command {
        Command::DeleteDataset(dataset_id) => {
            let deleted = pages
                .delete_dataset(&dataset_id)
                .await
                .with_context(|| format!("Failed to delete dataset {}", dataset_id))?;
            tracing::info!("Deleted {} pages of dataset {}", deleted, dataset_id);
        }
        Command::Load(directory) => {
            let directory = directory
                .unwrap_or_else(|| PathBuf::from(&config.loader.batch_base_directory));
            let parser = XmlParser::new(ParserSettings {
                resource_base_url: config.fulltext.resource_base_url.clone(),
            });
            let ingester = Ingester::new(parser, pages, config.loader.stop_on_save_error);

            let report = ingester
                .load_directory(&directory)
                .await
                .with_context(|| format!("Failed to load {}", directory.display()))?;
            tracing::info!(
                "Loaded {} of {} files ({} annotations, {} skipped)",
                report.pages_saved,
                report.files,
                report.annotations_accepted,
                report.annotations_skipped
            );
        }
    }

    Ok(())
}

//! Fulltext document loading
//!
//! Turns EDM fulltext XML documents into [`Page`](crate::model::Page)
//! aggregates and feeds them to the page repository.

mod error;
mod identifier;
mod ingest;
mod parser;
mod progress;

pub use error::{LoaderError, RecordError, Result};
pub use identifier::{parse_resource_url, IdentifierError, ResourceIdentifier};
pub use ingest::{parse_path, IngestError, Ingester, LoadReport};
pub use parser::{ParserSettings, XmlParser};
pub use progress::{ProgressCounter, ProgressSink, RecordOutcome};

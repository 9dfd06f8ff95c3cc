//! Loader error types
//!
//! [`LoaderError`] aborts a whole document; [`RecordError`] only costs the
//! single annotation record it was raised for.

use thiserror::Error;

/// Fatal errors: the document produces no page
#[derive(Debug, Error)]
pub enum LoaderError {
    /// More than one FullTextResource in the same document
    #[error("{file} - multiple FullTextResource elements found")]
    DuplicateResource { file: String },

    /// Resource url does not split into dataset, local and resource id
    #[error("{file} - error retrieving ids from text url {url}")]
    MalformedIdentifier { file: String, url: String },

    /// Resource url lives outside the configured base url
    #[error("{file} - text url '{url}' doesn't start with configured resource base url '{base_url}'")]
    ConfigurationMismatch {
        file: String,
        url: String,
        base_url: String,
    },

    /// Required resource-level data is absent
    #[error("{file} - {reason}")]
    MissingData { file: String, reason: String },

    /// Post-parse validation failed
    #[error("{file} - incomplete annotation page: {reason}")]
    IncompleteAggregate { file: String, reason: String },

    /// The token reader could not continue
    #[error("{file} - error reading xml: {source}")]
    Xml {
        file: String,
        #[source]
        source: quick_xml::Error,
    },

    /// The document ended while an element was still open
    #[error("{file} - document ended inside <{element}>")]
    UnexpectedEof { file: String, element: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable errors scoped to one annotation record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("no {0} defined")]
    MissingData(String),

    #[error("illegal value: {0}")]
    IllegalValue(String),
}

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

//! Error types for doclayer.

use std::io;
use thiserror::Error;

/// Result type alias for doclayer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting, validating or storing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An entity lacks the box required by the hierarchical model.
    #[error("Entity {index} in layer '{layer}' has no bounding box")]
    MissingGeometry { layer: String, index: usize },

    /// An entity sits on a page the document does not have.
    #[error("Entity {index} in layer '{layer}' is on page {page} but the document has {page_count} pages")]
    PageOutOfRange {
        layer: String,
        index: usize,
        page: usize,
        page_count: usize,
    },

    /// No adapter is registered for the requested format pair.
    #[error("No adapter converts '{source_format}' to '{target_format}'")]
    UnsupportedFormat {
        source_format: String,
        target_format: String,
    },

    /// A forward or reverse walk failed.
    #[error("Conversion from '{source_format}' to '{target_format}' failed: {source}")]
    Conversion {
        source_format: String,
        target_format: String,
        source: Box<Error>,
    },

    /// The document does not satisfy the layered schema.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored or cached document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// An offset pair falls outside the text it indexes.
    #[error("Span {start}..{end} is out of range (text has {len} characters)")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// Options were rejected at the boundary.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error raised inside a conversion walk.
    pub fn conversion(
        source_format: impl Into<String>,
        target_format: impl Into<String>,
        err: Error,
    ) -> Self {
        Error::Conversion {
            source_format: source_format.into(),
            target_format: target_format.into(),
            source: Box::new(err),
        }
    }

    /// Whether the error only affects a single entity and conversion can go on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::MissingGeometry { .. } | Error::PageOutOfRange { .. })
    }
}

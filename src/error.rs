//! Error types for the folio library.

use std::io;
use thiserror::Error;

/// Result type alias for folio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, exporting or saving documents.
///
/// Serializers never produce errors; everything here comes from input
/// parsing, configuration, or one of the collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input is not a JSON document or node.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A node has attributes of the wrong shape (strict parsing only).
    #[error("Malformed node: {0}")]
    MalformedNode(String),

    /// The visual renderer failed for a logical page.
    #[error("Rendering failed on page {page}: {message}")]
    Render {
        /// 1-indexed logical page number
        page: usize,
        /// Renderer message
        message: String,
    },

    /// The PDF writer failed.
    #[error("Write failed: {0}")]
    Write(String),

    /// Page geometry or other configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Document not found in the store.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Attempt to delete the only page of a document.
    #[error("Cannot delete the last remaining page")]
    LastPage,

    /// Page index is out of range.
    #[error("Page index {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Persistence failure other than a missing document.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The export was abandoned by the caller.
    #[error("Export cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl Error {
    /// Check whether the error aborts an export run.
    pub fn is_export_failure(&self) -> bool {
        matches!(
            self,
            Error::Render { .. } | Error::Write(_) | Error::Cancelled
        )
    }
}

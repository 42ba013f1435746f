//! Error types for config-merge.

use thiserror::Error;

/// Result type alias for config-merge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while merging documents.
#[derive(Error, Debug)]
pub enum Error {
    /// One of the input documents is not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// An element could not be placed in its document (detached from the root
    /// or missing from its parent's child list).
    #[error("invalid element: {0}")]
    InvalidElement(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this error means an input could not be parsed.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedXml(_))
    }
}

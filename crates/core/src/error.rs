//! Error types for the dbcost catalog builder.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the dbcost catalog builder.
///
/// Only [`Error::Fetch`] is recoverable: the provider it came from is skipped
/// and the run continues. Every other variant aborts the whole run.
#[derive(Error, Debug)]
pub enum Error {
    /// Network or transport failure while fetching a vendor feed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Malformed vendor document or a value that fails to parse.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The catalog output path already exists.
    #[error("Output already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Error::Fetch(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether the run may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Fetch(_))
    }
}

//! Error types for the command line.

use solr_search_repository::SearchBackendError;
use thiserror::Error;

/// Errors that can occur while setting up or running a command.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from the search backend.
    #[error("Backend error: {0}")]
    BackendError(#[from] SearchBackendError),

    /// Failed to read an input file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input that couldn't be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

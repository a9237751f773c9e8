//! Search backend error types.

use thiserror::Error;

/// Unified errors from search backend operations.
///
/// Used by the `SearchBackend` trait and `SearchService`. Variants carry
/// messages rather than source errors so results can be cloned into batch
/// summaries.
#[derive(Debug, Clone, Error)]
pub enum SearchBackendError {
    /// Invalid input (unknown fields, empty IDs, read-only index, ...).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The Solr server could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to index items.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Failed to delete items.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Failed to commit pending changes.
    #[error("Commit error: {0}")]
    CommitError(String),

    /// A search request was rejected by Solr.
    #[error("Search error: {0}")]
    SearchError(String),

    /// Failed to parse a Solr response.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize a request body.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchBackendError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    pub fn commit(msg: impl Into<String>) -> Self {
        Self::CommitError(msg.into())
    }

    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Error for an operation on an index that doesn't accept writes.
    pub fn read_only(index_id: &str) -> Self {
        Self::ValidationError(format!("Index {} is read-only", index_id))
    }

    /// Returns true if the error means the server was unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}

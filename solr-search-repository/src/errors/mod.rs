//! Error types for the Solr search repository.
//!
//! This module provides a unified error type for all backend operations.

mod search_backend_error;

pub use search_backend_error::SearchBackendError;

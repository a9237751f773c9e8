//! Configuration types for the SearchService.

/// Configuration for the SearchService.
///
/// Limits how many items a single `index_items` call may carry. The
/// backend still splits accepted calls into chunks of the index's own
/// `batch_size`.
#[derive(Debug, Clone)]
pub struct SearchServiceConfig {
    /// Maximum number of items accepted by one indexing call.
    ///
    /// `None` disables the limit. Defaults to 1000.
    pub max_batch_size: Option<usize>,
}

impl Default for SearchServiceConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
        }
    }
}

impl SearchServiceConfig {
    /// Create a config with no batch size limit.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }
}

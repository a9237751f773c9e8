//! Search backend trait definition.

use async_trait::async_trait;
use solr_search_shared::{IndexItem, MultiIndexQuery, MultiResultSet, ResultSet, SearchQuery};

use crate::errors::SearchBackendError;
use crate::types::Index;

/// Abstracts the search server an index lives on.
///
/// Implementations are injected into `SearchService`, which lets tests run
/// against mock backends.
///
/// # Deferred commits
///
/// Deletions don't commit right away. They schedule a commit which the
/// caller flushes with [`SearchBackend::flush_pending_commit`] (or an
/// explicit [`SearchBackend::commit`]) once it is done writing. Searches
/// issued before that may still see the deleted items.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Check whether the server is reachable and healthy.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The server answered the ping
    /// * `Ok(false)` - The server answered but reported a problem
    /// * `Err(SearchBackendError)` - The server couldn't be reached
    async fn ping(&self) -> Result<bool, SearchBackendError>;

    /// Make all pending writes visible to subsequent searches.
    async fn commit(&self) -> Result<(), SearchBackendError>;

    /// Index items of an index, replacing existing documents with the same ID.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - IDs of the items that were sent to the server
    /// * `Err(SearchBackendError)` - If the update request failed
    async fn index_items(
        &self,
        index: &Index,
        items: &[IndexItem],
    ) -> Result<Vec<String>, SearchBackendError>;

    /// Delete specific items of an index. Schedules a commit.
    async fn delete_items(&self, index: &Index, item_ids: &[String])
        -> Result<(), SearchBackendError>;

    /// Delete all items of an index. Schedules a commit.
    async fn delete_all_items(&self, index: &Index) -> Result<(), SearchBackendError>;

    /// Execute a search on one index.
    async fn search(
        &self,
        index: &Index,
        query: &SearchQuery,
    ) -> Result<ResultSet, SearchBackendError>;

    /// Execute a search across several indexes of this server.
    async fn search_multi(
        &self,
        indexes: &[Index],
        query: &MultiIndexQuery,
    ) -> Result<MultiResultSet, SearchBackendError>;

    /// Returns true if a deletion scheduled a commit that hasn't run yet.
    fn has_pending_commit(&self) -> bool;

    /// Run the scheduled commit, if any.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A commit was issued
    /// * `Ok(false)` - Nothing was pending
    async fn flush_pending_commit(&self) -> Result<bool, SearchBackendError> {
        if !self.has_pending_commit() {
            return Ok(false);
        }
        self.commit().await?;
        Ok(true)
    }
}

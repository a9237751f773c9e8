//! Search service implementation.
//!
//! This module provides the main service for working with indexes on a
//! search backend. Application code uses it to index, delete and search
//! items; it validates input and delegates to a [`SearchBackend`].

use solr_search_shared::{IndexItem, MultiIndexQuery, MultiResultSet, ResultSet, SearchQuery};
use tracing::{info, warn};

use crate::config::SearchServiceConfig;
use crate::errors::SearchBackendError;
use crate::interfaces::SearchBackend;
use crate::types::{BatchIndexResult, BatchIndexSummary, Index};
use crate::utils::validate_item_id;

/// The main service for working with search indexes.
///
/// Wraps a boxed [`SearchBackend`], so tests can substitute a mock backend.
///
/// # Example
///
/// ```no_run
/// use solr_search_repository::{FieldConfig, Index, SearchService, SolrBackend, SolrConnectionConfig};
/// use solr_search_shared::{IndexItem, SearchQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = SolrBackend::new(SolrConnectionConfig::default())?;
/// let service = SearchService::new(Box::new(backend));
/// let index = Index::new("articles", "local").with_field("title", FieldConfig::new("text"));
///
/// service
///     .index_items(&index, vec![IndexItem::new("1").with_value("title", "Hello".into())])
///     .await?;
/// let results = service.search(&index, &SearchQuery::new("articles").keys("hello")).await?;
/// println!("{} results", results.result_count);
/// # Ok(())
/// # }
/// ```
pub struct SearchService {
    backend: Box<dyn SearchBackend>,
    config: SearchServiceConfig,
}

impl SearchService {
    /// Create a new SearchService with default configuration.
    ///
    /// The default configuration accepts up to 1000 items per indexing call.
    pub fn new(backend: Box<dyn SearchBackend>) -> Self {
        Self {
            backend,
            config: SearchServiceConfig::default(),
        }
    }

    /// Create a new SearchService with custom configuration.
    pub fn with_config(backend: Box<dyn SearchBackend>, config: SearchServiceConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &dyn SearchBackend {
        self.backend.as_ref()
    }

    fn validate_batch_size(&self, size: usize) -> Result<(), SearchBackendError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchBackendError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Returns true if the backend answers its ping.
    ///
    /// Errors are logged and reported as unavailable.
    pub async fn is_available(&self) -> bool {
        match self.backend.ping().await {
            Ok(available) => available,
            Err(e) => {
                warn!(error = %e, "Search backend is not available");
                false
            }
        }
    }

    /// Index items and return a summary of which were indexed.
    ///
    /// Items are sent in chunks of the index's `batch_size`. A chunk that
    /// fails marks all of its items as failed and indexing continues with
    /// the next chunk; items the backend didn't report back (for example
    /// because an alter hook dropped their documents) count as failed too.
    ///
    /// # Arguments
    ///
    /// * `index` - The index the items belong to
    /// * `items` - Items with their field values
    ///
    /// # Returns
    ///
    /// * `Ok(BatchIndexSummary)` - Counts plus one result per item
    /// * `Err(SearchBackendError::BatchSizeExceeded)` - If more items than `max_batch_size` are passed
    /// * `Err(SearchBackendError::ValidationError)` - If an item ID is empty or the index is read-only
    /// * `Err(SearchBackendError::ConnectionError)` - If the server became unreachable
    pub async fn index_items(
        &self,
        index: &Index,
        items: Vec<IndexItem>,
    ) -> Result<BatchIndexSummary, SearchBackendError> {
        if items.is_empty() {
            return Ok(BatchIndexSummary::default());
        }

        self.validate_batch_size(items.len())?;
        for item in &items {
            validate_item_id(&item.id)?;
        }
        index.ensure_writable()?;

        let mut summary = BatchIndexSummary {
            total: items.len(),
            ..Default::default()
        };

        for chunk in items.chunks(index.options.batch_size.max(1)) {
            match self.backend.index_items(index, chunk).await {
                Ok(indexed) => {
                    for item in chunk {
                        let success = indexed.contains(&item.id);
                        summary.results.push(BatchIndexResult {
                            item_id: item.id.clone(),
                            success,
                            error: (!success).then(|| {
                                SearchBackendError::index("Item was not sent to the server")
                            }),
                        });
                    }
                }
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => {
                    warn!(index_id = %index.id, error = %e, items = chunk.len(), "Failed to index chunk");
                    for item in chunk {
                        summary.results.push(BatchIndexResult {
                            item_id: item.id.clone(),
                            success: false,
                            error: Some(e.clone()),
                        });
                    }
                }
            }
        }

        summary.succeeded = summary.results.iter().filter(|r| r.success).count();
        summary.failed = summary.total - summary.succeeded;

        info!(
            index_id = %index.id,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Indexed items"
        );
        Ok(summary)
    }

    /// Delete items of an index. The deletion becomes visible after the
    /// next commit.
    pub async fn delete_items(
        &self,
        index: &Index,
        item_ids: &[String],
    ) -> Result<(), SearchBackendError> {
        if item_ids.is_empty() {
            return Ok(());
        }
        self.validate_batch_size(item_ids.len())?;
        for id in item_ids {
            validate_item_id(id)?;
        }

        self.backend.delete_items(index, item_ids).await
    }

    /// Remove all items of an index from the server. The deletion becomes
    /// visible after the next commit.
    pub async fn clear(&self, index: &Index) -> Result<(), SearchBackendError> {
        self.backend.delete_all_items(index).await
    }

    /// Search one index.
    pub async fn search(
        &self,
        index: &Index,
        query: &SearchQuery,
    ) -> Result<ResultSet, SearchBackendError> {
        query.validate().map_err(SearchBackendError::validation)?;
        if query.index_id != index.id {
            return Err(SearchBackendError::validation(format!(
                "Query targets index {} but was run on index {}",
                query.index_id, index.id
            )));
        }

        self.backend.search(index, query).await
    }

    /// Search several indexes at once.
    ///
    /// `indexes` must contain every index the query names; all of them have
    /// to live on the same server.
    pub async fn search_multi(
        &self,
        indexes: &[Index],
        query: &MultiIndexQuery,
    ) -> Result<MultiResultSet, SearchBackendError> {
        query.validate().map_err(SearchBackendError::validation)?;

        let selected = query
            .index_ids
            .iter()
            .map(|id| {
                indexes
                    .iter()
                    .find(|index| index.id == *id)
                    .cloned()
                    .ok_or_else(|| SearchBackendError::validation(format!("Unknown index {}", id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(first) = selected.first() {
            if selected.iter().any(|index| index.server_id != first.server_id) {
                return Err(SearchBackendError::validation(
                    "Multi-index searches require all indexes to be on the same server",
                ));
            }
        }

        self.backend.search_multi(&selected, query).await
    }

    /// Commit all pending changes.
    pub async fn commit(&self) -> Result<(), SearchBackendError> {
        self.backend.commit().await
    }

    pub fn has_pending_commit(&self) -> bool {
        self.backend.has_pending_commit()
    }

    /// Run the commit scheduled by earlier deletions, if any.
    pub async fn flush_pending_commit(&self) -> Result<bool, SearchBackendError> {
        self.backend.flush_pending_commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldConfig, IndexOptions};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Mock backend for testing
    #[derive(Default)]
    struct MockBackend {
        indexed: Arc<Mutex<Vec<Vec<String>>>>,
        deleted: Arc<Mutex<Vec<String>>>,
        searched: Arc<Mutex<Vec<String>>>,
        pending: AtomicBool,
        fail_chunks_containing: Option<String>,
        drop_item: Option<String>,
        unreachable: bool,
    }

    #[async_trait]
    impl SearchBackend for MockBackend {
        async fn ping(&self) -> Result<bool, SearchBackendError> {
            if self.unreachable {
                return Err(SearchBackendError::connection("Connection refused"));
            }
            Ok(true)
        }

        async fn commit(&self) -> Result<(), SearchBackendError> {
            self.pending.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn index_items(
            &self,
            _index: &Index,
            items: &[IndexItem],
        ) -> Result<Vec<String>, SearchBackendError> {
            if self.unreachable {
                return Err(SearchBackendError::connection("Connection refused"));
            }
            let ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
            if let Some(failing) = &self.fail_chunks_containing {
                if ids.contains(failing) {
                    return Err(SearchBackendError::index("Mock failure"));
                }
            }
            self.indexed.lock().await.push(ids.clone());
            Ok(ids
                .into_iter()
                .filter(|id| Some(id) != self.drop_item.as_ref())
                .collect())
        }

        async fn delete_items(
            &self,
            _index: &Index,
            item_ids: &[String],
        ) -> Result<(), SearchBackendError> {
            self.deleted.lock().await.extend(item_ids.iter().cloned());
            self.pending.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_all_items(&self, index: &Index) -> Result<(), SearchBackendError> {
            index.ensure_writable()?;
            self.deleted.lock().await.push("*".to_string());
            self.pending.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn search(
            &self,
            index: &Index,
            _query: &SearchQuery,
        ) -> Result<ResultSet, SearchBackendError> {
            self.searched.lock().await.push(index.id.clone());
            Ok(ResultSet::empty())
        }

        async fn search_multi(
            &self,
            indexes: &[Index],
            _query: &MultiIndexQuery,
        ) -> Result<MultiResultSet, SearchBackendError> {
            let mut searched = self.searched.lock().await;
            searched.extend(indexes.iter().map(|index| index.id.clone()));
            Ok(MultiResultSet::default())
        }

        fn has_pending_commit(&self) -> bool {
            self.pending.load(Ordering::SeqCst)
        }
    }

    fn test_index(batch_size: usize) -> Index {
        Index::new("solr_search_index", "solr_search_server")
            .with_field("name", FieldConfig::new("text"))
            .with_options(IndexOptions {
                batch_size,
                ..Default::default()
            })
    }

    fn items(ids: &[&str]) -> Vec<IndexItem> {
        ids.iter().map(|id| IndexItem::new(*id)).collect()
    }

    #[tokio::test]
    async fn test_is_available() {
        let service = SearchService::new(Box::new(MockBackend::default()));
        assert!(service.is_available().await);

        let service = SearchService::new(Box::new(MockBackend {
            unreachable: true,
            ..Default::default()
        }));
        assert!(!service.is_available().await);
    }

    #[tokio::test]
    async fn test_index_items_empty() {
        let service = SearchService::new(Box::new(MockBackend::default()));

        let result = service.index_items(&test_index(50), vec![]).await.unwrap();

        assert_eq!(result.total, 0);
        assert_eq!(result.succeeded, 0);
        assert!(result.results.is_empty());
    }

    #[tokio::test]
    async fn test_index_items_in_chunks() {
        let backend = MockBackend::default();
        let indexed = Arc::clone(&backend.indexed);
        let service = SearchService::new(Box::new(backend));

        let result = service
            .index_items(&test_index(2), items(&["1", "2", "3", "4", "5"]))
            .await
            .unwrap();

        assert_eq!(result.total, 5);
        assert_eq!(result.succeeded, 5);
        assert_eq!(result.indexed_ids(), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(indexed.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_chunk_reported_per_item() {
        let service = SearchService::new(Box::new(MockBackend {
            fail_chunks_containing: Some("3".to_string()),
            ..Default::default()
        }));

        let result = service
            .index_items(&test_index(2), items(&["1", "2", "3", "4"]))
            .await
            .unwrap();

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.indexed_ids(), vec!["1", "2"]);
        assert!(matches!(
            result.results[2].error,
            Some(SearchBackendError::IndexError(_))
        ));
    }

    #[tokio::test]
    async fn test_dropped_item_counts_as_failed() {
        let service = SearchService::new(Box::new(MockBackend {
            drop_item: Some("2".to_string()),
            ..Default::default()
        }));

        let result = service
            .index_items(&test_index(50), items(&["1", "2"]))
            .await
            .unwrap();

        assert_eq!(result.succeeded, 1);
        assert!(!result.results[1].success);
    }

    #[tokio::test]
    async fn test_connection_error_aborts_indexing() {
        let service = SearchService::new(Box::new(MockBackend {
            unreachable: true,
            ..Default::default()
        }));

        let result = service.index_items(&test_index(50), items(&["1"])).await;
        assert!(matches!(result, Err(SearchBackendError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn test_index_items_validation() {
        let service = SearchService::with_config(
            Box::new(MockBackend::default()),
            SearchServiceConfig::with_max_batch_size(2),
        );

        let too_many = service
            .index_items(&test_index(50), items(&["1", "2", "3"]))
            .await;
        assert!(matches!(
            too_many,
            Err(SearchBackendError::BatchSizeExceeded { provided: 3, max: 2 })
        ));

        let empty_id = service.index_items(&test_index(50), items(&[" "])).await;
        assert!(matches!(empty_id, Err(SearchBackendError::ValidationError(_))));

        let mut read_only = test_index(50);
        read_only.read_only = true;
        assert!(service.index_items(&read_only, items(&["1"])).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_schedules_commit() {
        let service = SearchService::new(Box::new(MockBackend::default()));
        let index = test_index(50);

        service.clear(&index).await.unwrap();
        assert!(service.has_pending_commit());

        assert!(service.flush_pending_commit().await.unwrap());
        assert!(!service.has_pending_commit());
        assert!(!service.flush_pending_commit().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_items() {
        let backend = MockBackend::default();
        let deleted = Arc::clone(&backend.deleted);
        let service = SearchService::new(Box::new(backend));
        let index = test_index(50);

        service.delete_items(&index, &[]).await.unwrap();
        assert!(!service.has_pending_commit());

        service
            .delete_items(&index, &["1".to_string(), "2".to_string()])
            .await
            .unwrap();
        assert_eq!(*deleted.lock().await, vec!["1", "2"]);
        assert!(service.has_pending_commit());

        assert!(service.delete_items(&index, &[String::new()]).await.is_err());
    }

    #[tokio::test]
    async fn test_search_validation() {
        let service = SearchService::new(Box::new(MockBackend::default()));
        let index = test_index(50);

        assert!(service
            .search(&index, &SearchQuery::new("solr_search_index"))
            .await
            .is_ok());
        assert!(service
            .search(&index, &SearchQuery::new("other_index"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_search_multi_selects_indexes() {
        let backend = MockBackend::default();
        let searched = Arc::clone(&backend.searched);
        let service = SearchService::new(Box::new(backend));
        let indexes = vec![
            Index::new("a", "srv"),
            Index::new("b", "srv"),
            Index::new("c", "srv"),
        ];

        service
            .search_multi(&indexes, &MultiIndexQuery::new(vec!["c".into(), "a".into()]))
            .await
            .unwrap();
        assert_eq!(*searched.lock().await, vec!["c", "a"]);

        let unknown = MultiIndexQuery::new(vec!["missing".into()]);
        assert!(service.search_multi(&indexes, &unknown).await.is_err());

        let mixed = vec![Index::new("a", "srv"), Index::new("b", "other")];
        let query = MultiIndexQuery::new(vec!["a".into(), "b".into()]);
        assert!(service.search_multi(&mixed, &query).await.is_err());
    }
}

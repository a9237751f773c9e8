//! Alter hooks for data in transit to and from Solr.
//!
//! Hooks are registered once on a [`HookRegistry`] and invoked by the Solr
//! backend at fixed points: before a search request is sent, when field
//! name mappings are computed, before documents are submitted and after
//! results are parsed. Every method has a no-op default so a hook only
//! implements what it needs.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use solr_search_shared::{IndexItem, MultiIndexQuery, MultiResultSet, ResultSet, SearchQuery};

use crate::solr::{FieldMap, SolrDocument, SolrRequest};
use crate::types::Index;

/// Extension point for observing or mutating data in transit.
///
/// # Example
///
/// ```
/// use solr_search_repository::interfaces::SolrAlterHook;
/// use solr_search_repository::solr::SolrRequest;
/// use solr_search_shared::SearchQuery;
///
/// struct FooBar;
///
/// impl SolrAlterHook for FooBar {
///     fn alter_query(&self, request: &mut SolrRequest, query: &SearchQuery) {
///         if query.get_option("foobar").is_some() {
///             request.set_param("foo", "bar");
///         }
///     }
/// }
/// ```
pub trait SolrAlterHook: Send + Sync {
    /// Alter a search request before it is sent.
    fn alter_query(&self, _request: &mut SolrRequest, _query: &SearchQuery) {}

    /// Alter the mapping of index field names to Solr field names.
    ///
    /// The map also contains the special fields `search_api_id` and
    /// `search_api_relevance`.
    fn alter_field_mapping(&self, _index: &Index, _fields: &mut FieldMap) {}

    /// Alter the mapping to Solr fields that store only the first value of
    /// a field.
    fn alter_single_value_field_mapping(&self, _index: &Index, _fields: &mut FieldMap) {}

    /// Alter documents before they are sent to Solr for indexing.
    ///
    /// `items` are the items the documents were generated from. Removing a
    /// document skips the corresponding item.
    fn alter_documents(
        &self,
        _documents: &mut Vec<SolrDocument>,
        _index: &Index,
        _items: &[IndexItem],
    ) {
    }

    /// Alter the results of a search; `response` is the raw Solr response.
    fn alter_results(&self, _results: &mut ResultSet, _query: &SearchQuery, _response: &Value) {}

    /// Alter a multi-index search request before it is sent.
    fn alter_multi_query(&self, _request: &mut SolrRequest, _query: &MultiIndexQuery) {}

    /// Alter the results of a multi-index search.
    fn alter_multi_results(
        &self,
        _results: &mut MultiResultSet,
        _query: &MultiIndexQuery,
        _response: &Value,
    ) {
    }
}

/// Ordered collection of alter hooks.
///
/// Hooks run in registration order; each sees the changes of the previous ones.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn SolrAlterHook>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn SolrAlterHook>) {
        self.hooks.push(hook);
    }

    pub fn with_hook(mut self, hook: Arc<dyn SolrAlterHook>) -> Self {
        self.register(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn alter_query(&self, request: &mut SolrRequest, query: &SearchQuery) {
        for hook in &self.hooks {
            hook.alter_query(request, query);
        }
    }

    pub fn alter_field_mapping(&self, index: &Index, fields: &mut FieldMap) {
        for hook in &self.hooks {
            hook.alter_field_mapping(index, fields);
        }
    }

    pub fn alter_single_value_field_mapping(&self, index: &Index, fields: &mut FieldMap) {
        for hook in &self.hooks {
            hook.alter_single_value_field_mapping(index, fields);
        }
    }

    pub fn alter_documents(
        &self,
        documents: &mut Vec<SolrDocument>,
        index: &Index,
        items: &[IndexItem],
    ) {
        for hook in &self.hooks {
            hook.alter_documents(documents, index, items);
        }
    }

    pub fn alter_results(&self, results: &mut ResultSet, query: &SearchQuery, response: &Value) {
        for hook in &self.hooks {
            hook.alter_results(results, query, response);
        }
    }

    pub fn alter_multi_query(&self, request: &mut SolrRequest, query: &MultiIndexQuery) {
        for hook in &self.hooks {
            hook.alter_multi_query(request, query);
        }
    }

    pub fn alter_multi_results(
        &self,
        results: &mut MultiResultSet,
        query: &MultiIndexQuery,
        response: &Value,
    ) {
        for hook in &self.hooks {
            hook.alter_multi_results(results, query, response);
        }
    }
}

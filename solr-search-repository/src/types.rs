//! Index and server configuration, plus batch result types.
//!
//! Both `Index` and `Server` are plain configuration owned by the caller.
//! They are usually deserialized from JSON:
//!
//! ```json
//! {
//!   "id": "solr_search_index",
//!   "server_id": "solr_search_server",
//!   "fields": {
//!     "name": { "type": "text", "boost": 5.0 },
//!     "keywords": { "type": "string", "multi_valued": true }
//!   },
//!   "options": { "index_directly": true }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::SearchBackendError;
use crate::solr::SolrConnectionConfig;

/// Default number of items sent to Solr per update request.
pub const DEFAULT_INDEX_BATCH_SIZE: usize = 50;

/// Configuration of one index field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    /// Data type identifier, e.g. `text`, `string`, `integer` or a
    /// registered custom type such as `tlong`.
    #[serde(rename = "type")]
    pub type_id: String,

    /// Whether the field keeps all of its values.
    #[serde(default)]
    pub multi_valued: bool,

    /// Fulltext boost, only used for fulltext fields.
    #[serde(default = "default_boost")]
    pub boost: f64,
}

fn default_boost() -> f64 {
    1.0
}

impl FieldConfig {
    /// A single-valued field of the given type.
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            multi_valued: false,
            boost: default_boost(),
        }
    }

    /// A multi-valued field of the given type.
    pub fn multi(type_id: impl Into<String>) -> Self {
        Self {
            multi_valued: true,
            ..Self::new(type_id)
        }
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }
}

/// Indexing options of an index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexOptions {
    /// Commit right after every update request instead of relying on
    /// the server's `commitWithin` setting.
    #[serde(default)]
    pub index_directly: bool,

    /// Number of items sent per update request.
    #[serde(default = "default_index_batch_size")]
    pub batch_size: usize,
}

fn default_index_batch_size() -> usize {
    DEFAULT_INDEX_BATCH_SIZE
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            index_directly: false,
            batch_size: DEFAULT_INDEX_BATCH_SIZE,
        }
    }
}

/// A named configuration describing how item fields map to search fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Index {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// ID of the server the index lives on.
    pub server_id: String,

    /// Field configuration keyed by index field name.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,

    #[serde(default)]
    pub options: IndexOptions,

    /// Read-only indexes refuse indexing and deletion.
    #[serde(default)]
    pub read_only: bool,
}

impl Index {
    pub fn new(id: impl Into<String>, server_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            server_id: server_id.into(),
            fields: BTreeMap::new(),
            options: IndexOptions::default(),
            read_only: false,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    pub fn with_options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    /// Configuration of a field, if the index has it.
    pub fn field(&self, name: &str) -> Option<&FieldConfig> {
        self.fields.get(name)
    }

    /// Fail if the index refuses writes.
    pub fn ensure_writable(&self) -> Result<(), SearchBackendError> {
        if self.read_only {
            return Err(SearchBackendError::read_only(&self.id));
        }
        Ok(())
    }
}

/// A named connection to a Solr server, owning zero or more indexes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Connection settings of the Solr core.
    #[serde(default)]
    pub backend: SolrConnectionConfig,
}

impl Server {
    pub fn new(id: impl Into<String>, backend: SolrConnectionConfig) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            backend,
        }
    }

    /// Returns true if the index lives on this server.
    pub fn owns(&self, index: &Index) -> bool {
        index.server_id == self.id
    }
}

/// Result of indexing a single item within a batch.
#[derive(Debug, Clone)]
pub struct BatchIndexResult {
    pub item_id: String,
    pub success: bool,
    /// Error if the item's update request failed.
    pub error: Option<SearchBackendError>,
}

/// Summary of an indexing batch: aggregate counts plus one result per item.
#[derive(Debug, Clone, Default)]
pub struct BatchIndexSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchIndexResult>,
}

impl BatchIndexSummary {
    /// IDs of the items that were indexed.
    pub fn indexed_ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.item_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_from_json() {
        let index: Index = serde_json::from_value(json!({
            "id": "solr_search_index",
            "server_id": "solr_search_server",
            "fields": {
                "name": {"type": "text", "boost": 5.0},
                "keywords": {"type": "string", "multi_valued": true},
                "width": {"type": "decimal"}
            },
            "options": {"index_directly": true}
        }))
        .unwrap();

        assert_eq!(index.field("name").unwrap().boost, 5.0);
        assert!(index.field("keywords").unwrap().multi_valued);
        assert!(!index.field("width").unwrap().multi_valued);
        assert_eq!(index.field("width").unwrap().boost, 1.0);
        assert!(index.options.index_directly);
        assert_eq!(index.options.batch_size, DEFAULT_INDEX_BATCH_SIZE);
        assert!(!index.read_only);
    }

    #[test]
    fn test_read_only_index_refuses_writes() {
        let mut index = Index::new("idx", "srv");
        assert!(index.ensure_writable().is_ok());

        index.read_only = true;
        assert!(matches!(
            index.ensure_writable(),
            Err(SearchBackendError::ValidationError(_))
        ));
    }

    #[test]
    fn test_server_owns_index() {
        let server = Server::new("solr_search_server", SolrConnectionConfig::default());
        assert!(server.owns(&Index::new("idx", "solr_search_server")));
        assert!(!server.owns(&Index::new("idx", "other_server")));
    }

    #[test]
    fn test_summary_indexed_ids() {
        let summary = BatchIndexSummary {
            total: 2,
            succeeded: 1,
            failed: 1,
            results: vec![
                BatchIndexResult {
                    item_id: "1".to_string(),
                    success: true,
                    error: None,
                },
                BatchIndexResult {
                    item_id: "2".to_string(),
                    success: false,
                    error: Some(SearchBackendError::index("boom")),
                },
            ],
        };
        assert_eq!(summary.indexed_ids(), vec!["1"]);
    }
}

//! Search result types.
//!
//! Result sets are produced by the backend's response parser and may be
//! adjusted by alter hooks before being handed back to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single matching item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultItem {
    /// The item's ID within its index.
    pub id: String,

    /// The index the item was found in.
    pub index_id: String,

    /// Relevance score reported by the backend.
    pub score: f64,

    /// Stored field values returned with the result, keyed by index field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<Value>>,
}

impl ResultItem {
    pub fn new(id: impl Into<String>, index_id: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            index_id: index_id.into(),
            score,
            fields: BTreeMap::new(),
        }
    }

    /// Key identifying the item across indexes: `{index_id}:{id}`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.index_id, self.id)
    }
}

/// A facet value with the number of matching items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Results of a single-index search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultSet {
    /// Total number of matching items, regardless of the requested range.
    pub result_count: u64,

    /// Returned items, ordered as the backend ranked them.
    pub items: Vec<ResultItem>,

    /// Facet counts keyed by index field name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facets: BTreeMap<String, Vec<FacetValue>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Search keys that were ignored by the backend.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,

    /// Additional data attached by alter hooks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_data: BTreeMap<String, Value>,

    /// Query time reported by the backend in milliseconds.
    #[serde(default)]
    pub took_ms: u64,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if no items were returned.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items returned in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// IDs of the returned items in result order.
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }
}

/// Results of a multi-index search.
///
/// Items carry the index they were found in; use [`ResultItem::key`] to
/// identify them uniquely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MultiResultSet {
    pub result_count: u64,
    pub items: Vec<ResultItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_data: BTreeMap<String, Value>,
    #[serde(default)]
    pub took_ms: u64,
}

impl MultiResultSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Keys (`{index_id}:{id}`) of the returned items in result order.
    pub fn keys(&self) -> Vec<String> {
        self.items.iter().map(ResultItem::key).collect()
    }

    /// Returned items belonging to one index.
    pub fn items_for_index<'a>(&'a self, index_id: &'a str) -> impl Iterator<Item = &'a ResultItem> {
        self.items.iter().filter(move |item| item.index_id == index_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_empty() {
        let results = ResultSet::empty();
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
        assert_eq!(results.result_count, 0);
    }

    #[test]
    fn test_result_set_ids() {
        let results = ResultSet {
            result_count: 12,
            items: vec![
                ResultItem::new("2", "idx", 3.5),
                ResultItem::new("4", "idx", 1.25),
            ],
            ..Default::default()
        };

        assert_eq!(results.ids(), vec!["2", "4"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results.result_count, 12);
    }

    #[test]
    fn test_multi_result_keys() {
        let results = MultiResultSet {
            result_count: 3,
            items: vec![
                ResultItem::new("1", "articles", 2.0),
                ResultItem::new("1", "pages", 1.0),
                ResultItem::new("9", "articles", 0.5),
            ],
            ..Default::default()
        };

        assert_eq!(results.keys(), vec!["articles:1", "pages:1", "articles:9"]);
        assert_eq!(results.items_for_index("articles").count(), 2);
    }

    #[test]
    fn test_empty_collections_not_serialized() {
        let json = serde_json::to_value(ResultSet::empty()).unwrap();
        assert!(json.get("facets").is_none());
        assert!(json.get("warnings").is_none());
        assert_eq!(json["result_count"], 0);
    }
}

//! Items handed to the backend for indexing.
//!
//! An item is identified by its ID within the index and carries a list of
//! values per index field. Whether a field keeps all of its values or only
//! the first one is decided by the index configuration, not by the item.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single typed value of an item field.
///
/// Serialized externally tagged, e.g. `{"text": "Hello"}` or
/// `{"date": "2024-01-01T00:00:00Z"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    /// Fulltext content, tokenized by the backend.
    Text(String),
    /// Exact string value.
    String(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Returns the string content for textual values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

/// An item to be indexed.
///
/// # Example
///
/// ```
/// use solr_search_shared::{FieldValue, IndexItem};
///
/// let item = IndexItem::new("1")
///     .with_value("name", FieldValue::Text("foo bar baz".to_string()))
///     .with_values("keywords", vec!["orange".into(), "apple".into()]);
///
/// assert_eq!(item.values("keywords").len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct IndexItem {
    /// The item's ID within its index.
    pub id: String,
    /// Values keyed by index field name.
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldValue>>,
}

impl IndexItem {
    /// Create an item without any field values.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Append a single value to a field.
    pub fn with_value(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.entry(field.into()).or_default().push(value);
        self
    }

    /// Append several values to a field.
    pub fn with_values(mut self, field: impl Into<String>, values: Vec<FieldValue>) -> Self {
        self.fields.entry(field.into()).or_default().extend(values);
        self
    }

    /// Values of a field, empty when the item doesn't carry it.
    pub fn values(&self, field: &str) -> &[FieldValue] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builder_appends_values() {
        let item = IndexItem::new("3")
            .with_value("keywords", "strawberry".into())
            .with_value("keywords", "grape".into());

        assert_eq!(item.id, "3");
        assert_eq!(
            item.values("keywords"),
            &[
                FieldValue::String("strawberry".to_string()),
                FieldValue::String("grape".to_string())
            ]
        );
        assert!(item.values("missing").is_empty());
    }

    #[test]
    fn test_deserialize_tagged_values() {
        let json = r#"{
            "id": "5",
            "fields": {
                "name": [{"text": "bar baz"}],
                "width": [{"decimal": 9.5}],
                "created": [{"date": "2014-06-01T12:00:00Z"}]
            }
        }"#;

        let item: IndexItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.values("name")[0].as_str(), Some("bar baz"));
        assert_eq!(item.values("width")[0], FieldValue::Decimal(9.5));
        assert_eq!(
            item.values("created")[0],
            FieldValue::Date(Utc.with_ymd_and_hms(2014, 6, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_deserialize_without_fields() {
        let item: IndexItem = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert!(item.fields.is_empty());
    }
}

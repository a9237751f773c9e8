//! Conversion of index items into Solr documents.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use solr_search_shared::{FieldValue, IndexItem};
use tracing::debug;

use crate::solr::data_types::DataTypeRegistry;
use crate::solr::field_mapping::{IndexFieldNames, SOLR_ITEM_ID_FIELD};
use crate::solr::request::SolrDocument;
use crate::types::Index;
use crate::utils::solr_document_id;

/// Format a date the way Solr expects it: UTC with a trailing `Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a value for a field whose type resolves to `base_type`.
///
/// Returns `None` for values that can't be represented in that type; such
/// values are left out of the document.
pub fn format_value(value: &FieldValue, base_type: &str) -> Option<Value> {
    match base_type {
        "date" => match value {
            FieldValue::Date(date) => Some(Value::String(format_date(date))),
            FieldValue::Integer(timestamp) => {
                DateTime::from_timestamp(*timestamp, 0).map(|d| Value::String(format_date(&d)))
            }
            FieldValue::Text(s) | FieldValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| Value::String(format_date(&d.with_timezone(&Utc)))),
            _ => None,
        },
        "boolean" => match value {
            FieldValue::Boolean(b) => Some(Value::Bool(*b)),
            FieldValue::Integer(i) => Some(Value::Bool(*i != 0)),
            FieldValue::Text(s) | FieldValue::String(s) => match s.as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        "integer" | "duration" => match value {
            FieldValue::Integer(i) => Some(Value::from(*i)),
            FieldValue::Decimal(d) if d.is_finite() => Some(Value::from(d.trunc() as i64)),
            FieldValue::Boolean(b) => Some(Value::from(i64::from(*b))),
            FieldValue::Text(s) | FieldValue::String(s) => {
                s.trim().parse::<i64>().ok().map(Value::from)
            }
            _ => None,
        },
        "decimal" => match value {
            FieldValue::Decimal(d) => Number::from_f64(*d).map(Value::Number),
            FieldValue::Integer(i) => Some(Value::from(*i)),
            FieldValue::Text(s) | FieldValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            _ => None,
        },
        _ => Some(Value::String(match value {
            FieldValue::Text(s) | FieldValue::String(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Decimal(d) => d.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Date(date) => format_date(date),
        })),
    }
}

/// Build the Solr document of one item.
///
/// Besides the mapped fields every document carries `id`, `index_id`,
/// `item_id` and the site `hash`. Item fields that the index doesn't
/// configure are ignored.
pub fn build_document(
    index: &Index,
    item: &IndexItem,
    names: &IndexFieldNames,
    registry: &DataTypeRegistry,
    site_hash: &str,
) -> SolrDocument {
    let mut document = SolrDocument::new();
    document.set_field("id", solr_document_id(site_hash, &index.id, &item.id));
    document.set_field("index_id", index.id.as_str());
    document.set_field(SOLR_ITEM_ID_FIELD, item.id.as_str());
    document.set_field("hash", site_hash);

    for (key, config) in &index.fields {
        let base_type = registry.base_type(&config.type_id);
        let values: Vec<Value> = item
            .values(key)
            .iter()
            .filter_map(|value| format_value(value, base_type))
            .collect();
        let Some(first) = values.first().cloned() else {
            continue;
        };
        let Some(name) = names.field(key) else {
            continue;
        };

        let fulltext = registry.is_fulltext(&config.type_id);
        match (config.multi_valued, fulltext) {
            (true, _) => document.set_field(name, Value::Array(values)),
            (false, true) => document.set_field(name, Value::Array(vec![first.clone()])),
            (false, false) => document.set_field(name, first.clone()),
        }

        if let Some(single) = names.single_value_field(key) {
            if single != name {
                let single_value = match (fulltext, first) {
                    (true, Value::String(s)) => Value::String(s),
                    (true, other) => Value::String(other.to_string()),
                    (false, other) => other,
                };
                document.set_field(single, single_value);
            }
        }
    }

    let unknown: Vec<&String> = item
        .fields
        .keys()
        .filter(|key| !index.fields.contains_key(*key))
        .collect();
    if !unknown.is_empty() {
        debug!(item_id = %item.id, fields = ?unknown, "Ignoring fields not configured on the index");
    }

    document
}

/// Build the documents of a batch of items, in item order.
pub fn build_documents(
    index: &Index,
    items: &[IndexItem],
    names: &IndexFieldNames,
    registry: &DataTypeRegistry,
    site_hash: &str,
) -> Vec<SolrDocument> {
    items
        .iter()
        .map(|item| build_document(index, item, names, registry, site_hash))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::HookRegistry;
    use crate::solr::field_mapping::build_field_names;
    use crate::types::FieldConfig;
    use chrono::TimeZone;
    use serde_json::json;

    fn test_index() -> Index {
        Index::new("solr_search_index", "solr_search_server")
            .with_field("name", FieldConfig::new("text"))
            .with_field("body", FieldConfig::multi("text"))
            .with_field("type", FieldConfig::new("string"))
            .with_field("keywords", FieldConfig::multi("string"))
            .with_field("width", FieldConfig::new("decimal"))
            .with_field("created", FieldConfig::new("date"))
            .with_field("views", FieldConfig::new("tlong"))
            .with_field("published", FieldConfig::new("boolean"))
    }

    fn build(item: &IndexItem) -> SolrDocument {
        let index = test_index();
        let registry = DataTypeRegistry::new();
        let names = build_field_names(&index, &registry, &HookRegistry::new());
        build_document(&index, item, &names, &registry, "abc123")
    }

    #[test]
    fn test_base_fields() {
        let document = build(&IndexItem::new("3"));

        assert_eq!(document.get("id"), Some(&json!("abc123-solr_search_index-3")));
        assert_eq!(document.get("index_id"), Some(&json!("solr_search_index")));
        assert_eq!(document.item_id(), Some("3"));
        assert_eq!(document.get("hash"), Some(&json!("abc123")));
        assert_eq!(document.len(), 4);
    }

    #[test]
    fn test_multi_valued_field_keeps_all_values_plus_first_for_sorting() {
        let item = IndexItem::new("1").with_values(
            "keywords",
            vec!["orange".into(), "apple".into(), "grape".into()],
        );
        let document = build(&item);

        assert_eq!(
            document.get("sm_keywords"),
            Some(&json!(["orange", "apple", "grape"]))
        );
        assert_eq!(document.get("ss_keywords"), Some(&json!("orange")));
    }

    #[test]
    fn test_single_valued_field_keeps_first_value_only() {
        let item = IndexItem::new("1")
            .with_values("type", vec!["item".into(), "article".into()])
            .with_values("views", vec![FieldValue::Integer(5), FieldValue::Integer(9)]);
        let document = build(&item);

        assert_eq!(document.get("ss_type"), Some(&json!("item")));
        assert_eq!(document.get("its_views"), Some(&json!(5)));
    }

    #[test]
    fn test_fulltext_fields() {
        let item = IndexItem::new("1")
            .with_value("name", FieldValue::Text("foo bar baz".to_string()))
            .with_value("body", FieldValue::Text("test foo".to_string()))
            .with_value("body", FieldValue::Text("case".to_string()));
        let document = build(&item);

        assert_eq!(document.get("tm_name"), Some(&json!(["foo bar baz"])));
        assert_eq!(document.get("ss_name"), Some(&json!("foo bar baz")));
        assert_eq!(document.get("tm_body"), Some(&json!(["test foo", "case"])));
        assert_eq!(document.get("ss_body"), Some(&json!("test foo")));
    }

    #[test]
    fn test_value_conversion() {
        let created = Utc.with_ymd_and_hms(2014, 6, 1, 12, 30, 0).unwrap();
        let item = IndexItem::new("1")
            .with_value("width", FieldValue::Decimal(1.5))
            .with_value("created", FieldValue::Date(created))
            .with_value("published", FieldValue::Integer(1));
        let document = build(&item);

        assert_eq!(document.get("fs_width"), Some(&json!(1.5)));
        assert_eq!(document.get("ds_created"), Some(&json!("2014-06-01T12:30:00Z")));
        assert_eq!(document.get("bs_published"), Some(&json!(true)));
    }

    #[test]
    fn test_unconvertible_and_unknown_values_skipped() {
        let item = IndexItem::new("1")
            .with_value("width", "wide".into())
            .with_value("not_configured", "x".into());
        let document = build(&item);

        assert!(document.get("fs_width").is_none());
        assert!(document.field_names().all(|name| !name.contains("not_configured")));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&FieldValue::Integer(0), "date"), Some(json!("1970-01-01T00:00:00Z")));
        assert_eq!(format_value(&FieldValue::Decimal(2.9), "integer"), Some(json!(2)));
        assert_eq!(format_value(&FieldValue::Decimal(f64::NAN), "decimal"), None);
        assert_eq!(format_value(&"0".into(), "boolean"), Some(json!(false)));
        assert_eq!(format_value(&FieldValue::Boolean(true), "string"), Some(json!("true")));
        assert_eq!(format_value(&"12".into(), "integer"), Some(json!(12)));
    }
}

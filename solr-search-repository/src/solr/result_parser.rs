//! Parsing of Solr `select` responses into result sets.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use solr_search_shared::{FacetValue, MultiResultSet, ResultItem, ResultSet};
use tracing::warn;

use crate::errors::SearchBackendError;
use crate::solr::field_mapping::{IndexFieldNames, SOLR_ITEM_ID_FIELD, SOLR_SCORE_FIELD};
use crate::types::Index;

/// Bookkeeping fields that are never reported as item fields.
const INTERNAL_FIELDS: &[&str] = &[
    "id",
    "index_id",
    "hash",
    SOLR_ITEM_ID_FIELD,
    SOLR_SCORE_FIELD,
    "_version_",
];

struct ParsedResponse<'a> {
    num_found: u64,
    docs: &'a [Value],
    took_ms: u64,
    warnings: Vec<String>,
}

fn parse_envelope(body: &Value) -> Result<ParsedResponse<'_>, SearchBackendError> {
    let response = body
        .get("response")
        .ok_or_else(|| SearchBackendError::parse("Solr response has no \"response\" section"))?;
    let num_found = response
        .get("numFound")
        .and_then(Value::as_u64)
        .ok_or_else(|| SearchBackendError::parse("Solr response has no numFound"))?;
    let docs = response
        .get("docs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let took_ms = body
        .pointer("/responseHeader/QTime")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut warnings = Vec::new();
    if body
        .pointer("/responseHeader/partialResults")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        warnings.push("Solr returned partial results".to_string());
    }

    Ok(ParsedResponse {
        num_found,
        docs,
        took_ms,
        warnings,
    })
}

/// The item ID of a returned document; Solr may hand it back as a number.
fn document_item_id(doc: &Map<String, Value>) -> Option<String> {
    match doc.get(SOLR_ITEM_ID_FIELD)? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        Value::Array(values) => values.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn document_item(
    doc: &Value,
    index_id: &str,
    names: &IndexFieldNames,
) -> Option<ResultItem> {
    let doc = doc.as_object()?;
    let id = document_item_id(doc)?;
    let score = doc
        .get(SOLR_SCORE_FIELD)
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let mut item = ResultItem::new(id, index_id, score);
    item.fields = document_fields(doc, names);
    Some(item)
}

/// Map returned Solr fields back to index fields. Values of the regular
/// mapping win over the single-value copies of the same field.
fn document_fields(
    doc: &Map<String, Value>,
    names: &IndexFieldNames,
) -> BTreeMap<String, Vec<Value>> {
    let mut fields = BTreeMap::new();
    let stored = doc
        .iter()
        .filter(|(name, _)| !INTERNAL_FIELDS.contains(&name.as_str()));

    for (solr_name, value) in stored.clone() {
        if let Some((key, _)) = names.fields.iter().find(|(_, solr)| *solr == solr_name) {
            fields.insert(key.clone(), values_of(value));
        }
    }
    for (solr_name, value) in stored {
        if let Some((key, _)) = names
            .single_value
            .iter()
            .find(|(_, solr)| *solr == solr_name)
        {
            fields
                .entry(key.clone())
                .or_insert_with(|| values_of(value));
        }
    }
    fields
}

fn values_of(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    }
}

/// Facet counts keyed by index field. Solr returns them as a flat
/// `[value, count, value, count, ...]` list per field.
fn parse_facets(body: &Value, names: &IndexFieldNames) -> BTreeMap<String, Vec<FacetValue>> {
    let Some(facet_fields) = body
        .pointer("/facet_counts/facet_fields")
        .and_then(Value::as_object)
    else {
        return BTreeMap::new();
    };

    facet_fields
        .iter()
        .map(|(solr_name, counts)| {
            let field = names
                .index_field_for(solr_name)
                .unwrap_or(solr_name.as_str())
                .to_string();
            let values = counts
                .as_array()
                .map(|counts| {
                    counts
                        .chunks(2)
                        .filter_map(|pair| match pair {
                            [value, count] => Some(FacetValue {
                                value: match value {
                                    Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                },
                                count: count.as_u64()?,
                            }),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            (field, values)
        })
        .collect()
}

/// Parse the response of a single-index search.
pub fn parse_search_response(
    body: &Value,
    index: &Index,
    names: &IndexFieldNames,
) -> Result<ResultSet, SearchBackendError> {
    let parsed = parse_envelope(body)?;

    let mut items = Vec::with_capacity(parsed.docs.len());
    for doc in parsed.docs {
        match document_item(doc, &index.id, names) {
            Some(item) => items.push(item),
            None => warn!(index_id = %index.id, "Skipping Solr document without item_id"),
        }
    }

    Ok(ResultSet {
        result_count: parsed.num_found,
        items,
        facets: parse_facets(body, names),
        warnings: parsed.warnings,
        took_ms: parsed.took_ms,
        ..Default::default()
    })
}

/// Parse the response of a multi-index search. Documents are attributed to
/// their index by the returned `index_id`.
pub fn parse_multi_response(
    body: &Value,
    indexes: &[(&Index, &IndexFieldNames)],
) -> Result<MultiResultSet, SearchBackendError> {
    let parsed = parse_envelope(body)?;

    let mut items = Vec::with_capacity(parsed.docs.len());
    for doc in parsed.docs {
        let index_id = doc.get("index_id").and_then(Value::as_str);
        let Some((index, names)) = indexes
            .iter()
            .find(|(index, _)| Some(index.id.as_str()) == index_id)
        else {
            warn!(index_id = ?index_id, "Skipping Solr document of an unsearched index");
            continue;
        };
        match document_item(doc, &index.id, names) {
            Some(item) => items.push(item),
            None => warn!(index_id = %index.id, "Skipping Solr document without item_id"),
        }
    }

    Ok(MultiResultSet {
        result_count: parsed.num_found,
        items,
        warnings: parsed.warnings,
        took_ms: parsed.took_ms,
        ..Default::default()
    })
}

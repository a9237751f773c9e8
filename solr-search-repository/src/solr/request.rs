//! Outgoing Solr requests and documents.
//!
//! These are the values alter hooks get to mutate: the search call
//! (query string, parameters and HTTP method) and the documents sent for
//! indexing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Encoded parameter length above which a search is sent as a POST.
pub const MAX_GET_QUERY_LENGTH: usize = 4000;

/// HTTP method used for a search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
}

/// Arguments of a search call against the `select` handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolrRequest {
    /// The main query (`q`).
    pub query: String,
    /// All other request parameters; repeated parameters (such as `fq`)
    /// keep their order.
    pub params: BTreeMap<String, Vec<String>>,
    pub method: RequestMethod,
}

impl SolrRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: BTreeMap::new(),
            method: RequestMethod::Get,
        }
    }

    /// Replace a parameter's values with a single value.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), vec![value.into()]);
    }

    /// Append a value to a (possibly repeated) parameter.
    pub fn add_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    /// First value of a parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a parameter.
    pub fn param_values(&self, key: &str) -> &[String] {
        self.params.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn remove_param(&mut self, key: &str) -> Option<Vec<String>> {
        self.params.remove(key)
    }

    /// Flatten into key/value pairs, `q` first.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("q".to_string(), self.query.clone())];
        for (key, values) in &self.params {
            for value in values {
                pairs.push((key.clone(), value.clone()));
            }
        }
        pairs
    }

    /// Length of the form-encoded parameters.
    pub fn encoded_len(&self) -> usize {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.to_pairs() {
            serializer.append_pair(&key, &value);
        }
        serializer.finish().len()
    }

    /// Pick GET or POST depending on the encoded length.
    pub fn choose_method(&mut self) {
        self.method = if self.encoded_len() > MAX_GET_QUERY_LENGTH {
            RequestMethod::Post
        } else {
            RequestMethod::Get
        };
    }

    /// Pick the method again after the request was altered, unless the
    /// method itself was changed from `previous`.
    pub fn refresh_method(&mut self, previous: RequestMethod) {
        if self.method == previous {
            self.choose_method();
        }
    }
}

/// A document ready to be sent to Solr.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolrDocument {
    fields: Map<String, Value>,
}

impl SolrDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Append a value to a field, turning it into an array if needed.
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.entry(name.into()) {
            serde_json::map::Entry::Vacant(entry) => {
                entry.insert(value);
            }
            serde_json::map::Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::Array(values) => values.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `item_id` field as a string.
    pub fn item_id(&self) -> Option<&str> {
        self.fields.get("item_id").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params() {
        let mut request = SolrRequest::new("*:*");
        request.add_param("fq", "index_id:\"a\"");
        request.add_param("fq", "hash:\"h\"");
        request.set_param("rows", "10");
        request.set_param("rows", "20");

        assert_eq!(request.param_values("fq").len(), 2);
        assert_eq!(request.param("rows"), Some("20"));
        assert_eq!(request.param("missing"), None);

        let pairs = request.to_pairs();
        assert_eq!(pairs[0], ("q".to_string(), "*:*".to_string()));
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_choose_method() {
        let mut request = SolrRequest::new("foo");
        request.choose_method();
        assert_eq!(request.method, RequestMethod::Get);

        request.set_param("fq", "x".repeat(MAX_GET_QUERY_LENGTH + 1));
        request.choose_method();
        assert_eq!(request.method, RequestMethod::Post);
    }

    #[test]
    fn test_refresh_method() {
        let mut request = SolrRequest::new("foo");
        request.choose_method();
        let previous = request.method;

        request.add_param("fq", "x".repeat(MAX_GET_QUERY_LENGTH + 1));
        request.refresh_method(previous);
        assert_eq!(request.method, RequestMethod::Post);

        // A method picked explicitly is kept.
        let mut request = SolrRequest::new("foo");
        request.method = RequestMethod::Post;
        request.refresh_method(RequestMethod::Get);
        assert_eq!(request.method, RequestMethod::Post);
    }

    #[test]
    fn test_document_add_field() {
        let mut doc = SolrDocument::new();
        doc.add_field("sm_keywords", "orange");
        assert_eq!(doc.get("sm_keywords"), Some(&json!("orange")));

        doc.add_field("sm_keywords", "apple");
        doc.add_field("sm_keywords", "pear");
        assert_eq!(
            doc.get("sm_keywords"),
            Some(&json!(["orange", "apple", "pear"]))
        );
    }

    #[test]
    fn test_document_serializes_flat() {
        let mut doc = SolrDocument::new();
        doc.set_field("item_id", "3");
        doc.set_field("its_width", 7);

        assert_eq!(doc.item_id(), Some("3"));
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"item_id": "3", "its_width": 7})
        );
    }
}

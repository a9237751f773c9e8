//! Data types and their Solr dynamic field prefixes.
//!
//! Every index field has a data type. The type decides which dynamic field
//! of the Solr schema the field is stored in: a field `body` of type
//! `integer` ends up in `its_body` (single-valued) or `itm_body`
//! (multi-valued). Custom types can be registered to expose additional
//! dynamic fields of the schema as indexable types; they declare a `prefix`
//! and must be backed by two dynamic fields, `{prefix}s_*` and `{prefix}m_*`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Type ID of fulltext fields.
pub const TEXT_TYPE: &str = "text";

/// Prefix of the built-in fulltext type; handled specially by the field mapper.
pub const TEXT_PREFIX: &str = "t";

/// Prefix used when a type can't be resolved.
const DEFAULT_PREFIX: &str = "s";

/// Fallback chains longer than this are treated as broken.
const MAX_FALLBACK_DEPTH: usize = 8;

/// Description of a data type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataTypeInfo {
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Type to fall back to where this one isn't supported.
    #[serde(default)]
    pub fallback: Option<String>,
    /// Solr dynamic field prefix; the fallback's prefix is used when absent.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl DataTypeInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        fallback: Option<&str>,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fallback: fallback.map(str::to_string),
            prefix: prefix.map(str::to_string),
        }
    }
}

/// Registry of known data types.
///
/// # Example
///
/// ```
/// use solr_search_repository::solr::{DataTypeInfo, DataTypeRegistry};
///
/// let mut registry = DataTypeRegistry::new();
/// registry.register(DataTypeInfo::new("location", "Location", Some("string"), Some("loc")));
///
/// assert_eq!(registry.prefix_for("location"), "loc");
/// assert_eq!(registry.prefix_for("tlong"), "it");
/// assert!(registry.is_fulltext("edge_n2_kw_text"));
/// ```
#[derive(Debug, Clone)]
pub struct DataTypeRegistry {
    types: BTreeMap<String, DataTypeInfo>,
}

impl Default for DataTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTypeRegistry {
    /// Registry with the built-in types plus the default custom types
    /// `edge_n2_kw_text` and `tlong`.
    pub fn new() -> Self {
        let mut registry = Self::builtin_only();
        registry.register(DataTypeInfo::new(
            "edge_n2_kw_text",
            "Fulltext (w/ partial matching)",
            Some(TEXT_TYPE),
            Some("te"),
        ));
        registry.register(DataTypeInfo::new(
            "tlong",
            "TrieLong",
            Some("integer"),
            Some("it"),
        ));
        registry
    }

    /// Registry with the built-in types only.
    pub fn builtin_only() -> Self {
        let builtin = [
            (TEXT_TYPE, "Fulltext", TEXT_PREFIX),
            ("string", "String", "s"),
            ("uri", "URI", "s"),
            ("integer", "Integer", "i"),
            ("duration", "Duration", "i"),
            ("decimal", "Decimal", "f"),
            ("date", "Date", "d"),
            ("boolean", "Boolean", "b"),
        ];

        let types = builtin
            .into_iter()
            .map(|(id, name, prefix)| {
                (id.to_string(), DataTypeInfo::new(id, name, None, Some(prefix)))
            })
            .collect();

        Self { types }
    }

    /// Register a custom data type, replacing any type with the same ID.
    pub fn register(&mut self, info: DataTypeInfo) {
        self.types.insert(info.id.clone(), info);
    }

    pub fn get(&self, type_id: &str) -> Option<&DataTypeInfo> {
        self.types.get(type_id)
    }

    /// All registered types ordered by ID.
    pub fn types(&self) -> impl Iterator<Item = &DataTypeInfo> {
        self.types.values()
    }

    /// The type itself followed by its fallbacks, as far as they are known.
    fn chain(&self, type_id: &str) -> Vec<&DataTypeInfo> {
        let mut chain = Vec::new();
        let mut current = self.types.get(type_id);
        while let Some(info) = current {
            let seen = chain.iter().any(|known: &&DataTypeInfo| known.id == info.id);
            if seen || chain.len() >= MAX_FALLBACK_DEPTH {
                break;
            }
            chain.push(info);
            current = info.fallback.as_deref().and_then(|f| self.types.get(f));
        }
        chain
    }

    /// Resolve a type to a known type: the type itself, else the closest
    /// registered fallback. Returns `None` for unknown types.
    pub fn resolve(&self, type_id: &str) -> Option<&DataTypeInfo> {
        self.chain(type_id).into_iter().next()
    }

    /// Dynamic field prefix of a type.
    ///
    /// Walks the fallback chain until a prefix is found and uses `s` (string)
    /// for unknown types.
    pub fn prefix_for(&self, type_id: &str) -> &str {
        self.chain(type_id)
            .into_iter()
            .find_map(|info| info.prefix.as_deref())
            .unwrap_or(DEFAULT_PREFIX)
    }

    /// ID of the built-in type a type ultimately falls back to, `string`
    /// for unknown types.
    pub fn base_type(&self, type_id: &str) -> &str {
        self.chain(type_id)
            .into_iter()
            .last()
            .filter(|info| info.fallback.is_none())
            .map(|info| info.id.as_str())
            .unwrap_or("string")
    }

    /// Returns true if the type is `text` or falls back to it.
    pub fn is_fulltext(&self, type_id: &str) -> bool {
        type_id == TEXT_TYPE || self.chain(type_id).iter().any(|info| info.id == TEXT_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prefixes() {
        let registry = DataTypeRegistry::new();
        assert_eq!(registry.prefix_for("text"), "t");
        assert_eq!(registry.prefix_for("string"), "s");
        assert_eq!(registry.prefix_for("uri"), "s");
        assert_eq!(registry.prefix_for("integer"), "i");
        assert_eq!(registry.prefix_for("duration"), "i");
        assert_eq!(registry.prefix_for("decimal"), "f");
        assert_eq!(registry.prefix_for("date"), "d");
        assert_eq!(registry.prefix_for("boolean"), "b");
    }

    #[test]
    fn test_default_custom_types() {
        let registry = DataTypeRegistry::new();

        let edge = registry.get("edge_n2_kw_text").unwrap();
        assert_eq!(edge.name, "Fulltext (w/ partial matching)");
        assert_eq!(edge.fallback.as_deref(), Some("text"));
        assert_eq!(registry.prefix_for("edge_n2_kw_text"), "te");

        let tlong = registry.get("tlong").unwrap();
        assert_eq!(tlong.name, "TrieLong");
        assert_eq!(tlong.fallback.as_deref(), Some("integer"));
        assert_eq!(registry.prefix_for("tlong"), "it");

        assert!(DataTypeRegistry::builtin_only().get("tlong").is_none());
    }

    #[test]
    fn test_unknown_type_uses_string_prefix() {
        let registry = DataTypeRegistry::new();
        assert!(registry.resolve("no_such_type").is_none());
        assert_eq!(registry.prefix_for("no_such_type"), "s");
        assert!(!registry.is_fulltext("no_such_type"));
    }

    #[test]
    fn test_type_without_prefix_inherits_fallback_prefix() {
        let mut registry = DataTypeRegistry::new();
        registry.register(DataTypeInfo::new("html", "HTML", Some("text"), None));
        registry.register(DataTypeInfo::new("price", "Price", Some("decimal"), None));

        assert_eq!(registry.prefix_for("html"), "t");
        assert!(registry.is_fulltext("html"));
        assert_eq!(registry.prefix_for("price"), "f");
        assert!(!registry.is_fulltext("price"));
    }

    #[test]
    fn test_fallback_cycle_terminates() {
        let mut registry = DataTypeRegistry::builtin_only();
        registry.register(DataTypeInfo::new("a", "A", Some("b"), None));
        registry.register(DataTypeInfo::new("b", "B", Some("a"), None));

        assert_eq!(registry.prefix_for("a"), "s");
        assert!(!registry.is_fulltext("a"));
    }

    #[test]
    fn test_base_type() {
        let registry = DataTypeRegistry::new();
        assert_eq!(registry.base_type("date"), "date");
        assert_eq!(registry.base_type("tlong"), "integer");
        assert_eq!(registry.base_type("edge_n2_kw_text"), "text");
        assert_eq!(registry.base_type("no_such_type"), "string");
    }

    #[test]
    fn test_fulltext_types() {
        let registry = DataTypeRegistry::new();
        assert!(registry.is_fulltext("text"));
        assert!(registry.is_fulltext("edge_n2_kw_text"));
        assert!(!registry.is_fulltext("string"));
        assert!(!registry.is_fulltext("tlong"));
    }
}

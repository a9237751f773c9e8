//! Mapping of index field names to Solr field names.
//!
//! Index fields are stored in dynamic Solr fields named
//! `{prefix}{m|s}_{key}`, where the prefix comes from the field's data type
//! and `m`/`s` says whether the field is multi-valued. Fulltext fields are
//! always stored multi-valued in `tm_{key}`. `:` is not allowed in Solr
//! field names and is replaced by `$`.
//!
//! Besides the regular mapping there is a single-value mapping: fields that
//! store only the first value of a field, which is what Solr can sort on.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use solr_search_shared::{ID_FIELD, RELEVANCE_FIELD};
use tracing::debug;

use crate::interfaces::HookRegistry;
use crate::solr::data_types::{DataTypeRegistry, TEXT_PREFIX};
use crate::types::{FieldConfig, Index};

/// Index field name -> Solr field name.
pub type FieldMap = BTreeMap<String, String>;

/// Solr field storing the item ID.
pub const SOLR_ITEM_ID_FIELD: &str = "item_id";

/// Pseudo-field holding the relevance score.
pub const SOLR_SCORE_FIELD: &str = "score";

/// Field mappings of one index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexFieldNames {
    /// Regular mapping, used for indexing, filtering and fulltext search.
    pub fields: FieldMap,
    /// Single-value mapping, used for sorting.
    pub single_value: FieldMap,
}

impl IndexFieldNames {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn single_value_field(&self, name: &str) -> Option<&str> {
        self.single_value.get(name).map(String::as_str)
    }

    /// Index field stored in a Solr field, checking the regular mapping first.
    pub fn index_field_for(&self, solr_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .chain(self.single_value.iter())
            .find(|(_, solr)| solr.as_str() == solr_name)
            .map(|(field, _)| field.as_str())
    }
}

/// Encode an index field key for use in a Solr field name.
pub fn encode_field_key(key: &str) -> String {
    key.replace(':', "$")
}

/// Solr field name of an index field in the regular mapping.
pub fn solr_field_name(registry: &DataTypeRegistry, key: &str, config: &FieldConfig) -> String {
    let prefix = registry.prefix_for(&config.type_id);
    let key = encode_field_key(key);
    if prefix == TEXT_PREFIX {
        return format!("{}m_{}", TEXT_PREFIX, key);
    }
    let cardinality = if config.multi_valued { 'm' } else { 's' };
    format!("{}{}_{}", prefix, cardinality, key)
}

/// Solr field name of an index field in the single-value mapping.
///
/// Fulltext fields get a string copy (`ss_{key}`), since tokenized fields
/// can't be sorted on.
pub fn single_value_field_name(
    registry: &DataTypeRegistry,
    key: &str,
    config: &FieldConfig,
) -> String {
    let prefix = registry.prefix_for(&config.type_id);
    let key = encode_field_key(key);
    if prefix == TEXT_PREFIX {
        return format!("ss_{}", key);
    }
    format!("{}s_{}", prefix, key)
}

/// Compute both mappings of an index and run the mapping alter hooks.
pub fn build_field_names(
    index: &Index,
    registry: &DataTypeRegistry,
    hooks: &HookRegistry,
) -> IndexFieldNames {
    let mut fields = special_fields();
    let mut single_value = special_fields();

    for (key, config) in &index.fields {
        fields.insert(key.clone(), solr_field_name(registry, key, config));
        single_value.insert(key.clone(), single_value_field_name(registry, key, config));
    }

    hooks.alter_field_mapping(index, &mut fields);
    hooks.alter_single_value_field_mapping(index, &mut single_value);

    IndexFieldNames {
        fields,
        single_value,
    }
}

fn special_fields() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert(ID_FIELD.to_string(), SOLR_ITEM_ID_FIELD.to_string());
    map.insert(RELEVANCE_FIELD.to_string(), SOLR_SCORE_FIELD.to_string());
    map
}

/// Computes and caches field mappings per index.
///
/// The cache is keyed by index ID; call [`FieldMapper::invalidate`] after
/// changing an index's field configuration.
#[derive(Debug)]
pub struct FieldMapper {
    registry: Arc<DataTypeRegistry>,
    hooks: Arc<HookRegistry>,
    cache: RwLock<HashMap<String, Arc<IndexFieldNames>>>,
}

impl FieldMapper {
    pub fn new(registry: Arc<DataTypeRegistry>, hooks: Arc<HookRegistry>) -> Self {
        Self {
            registry,
            hooks,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &DataTypeRegistry {
        &self.registry
    }

    /// Field mappings of an index, computed on first use.
    pub fn field_names(&self, index: &Index) -> Arc<IndexFieldNames> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(names) = cache.get(&index.id) {
                return Arc::clone(names);
            }
        }

        let names = Arc::new(build_field_names(index, &self.registry, &self.hooks));
        debug!(index_id = %index.id, fields = names.fields.len(), "Computed field mapping");

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(cache.entry(index.id.clone()).or_insert(names))
    }

    /// Drop the cached mapping of an index.
    pub fn invalidate(&self, index_id: &str) {
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(index_id);
    }
}

//! Search query types.
//!
//! A [`SearchQuery`] targets a single index, a [`MultiIndexQuery`] searches
//! several indexes on the same server at once. Both share the condition,
//! sort and range model defined here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::index_item::FieldValue;

/// Special field addressing the item ID.
pub const ID_FIELD: &str = "search_api_id";

/// Special field addressing the relevance score, usable for sorting.
pub const RELEVANCE_FIELD: &str = "search_api_relevance";

/// Comparison operator of a filter condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<>")]
    NotEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
}

impl Operator {
    /// Returns true for the four range operators.
    pub fn is_range(&self) -> bool {
        !matches!(self, Operator::Equal | Operator::NotEqual)
    }
}

/// How the members of a condition group are combined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

/// A single filter on an index field.
///
/// A `None` value matches items where the field is empty (`=`) or where it
/// has any value (`<>`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: Option<FieldValue>,
    #[serde(default)]
    pub operator: Operator,
}

impl Condition {
    pub fn new(field: impl Into<String>, value: Option<FieldValue>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            value,
            operator,
        }
    }
}

/// Member of a condition group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConditionItem {
    Condition(Condition),
    Group(ConditionGroup),
}

/// A set of conditions and nested groups joined by one conjunction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConditionGroup {
    #[serde(default)]
    pub conjunction: Conjunction,
    #[serde(default)]
    pub conditions: Vec<ConditionItem>,
}

impl ConditionGroup {
    /// Create an empty group with the given conjunction.
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            conditions: Vec::new(),
        }
    }

    /// Add a condition to this group.
    pub fn condition(
        mut self,
        field: impl Into<String>,
        value: Option<FieldValue>,
        operator: Operator,
    ) -> Self {
        self.conditions
            .push(ConditionItem::Condition(Condition::new(field, value, operator)));
        self
    }

    /// Add a nested group to this group.
    pub fn group(mut self, group: ConditionGroup) -> Self {
        self.conditions.push(ConditionItem::Group(group));
        self
    }

    /// Returns true if the group (recursively) contains no condition.
    pub fn is_empty(&self) -> bool {
        self.conditions.iter().all(|item| match item {
            ConditionItem::Condition(_) => false,
            ConditionItem::Group(group) => group.is_empty(),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort on an index field, or on relevance via [`RELEVANCE_FIELD`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Request for facet counts on an index field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetRequest {
    pub field: String,
    /// Maximum number of facet values, `None` for the backend default.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Minimum count for a value to be returned.
    #[serde(default = "default_min_count")]
    pub min_count: usize,
}

fn default_min_count() -> usize {
    1
}

impl FacetRequest {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            limit: None,
            min_count: default_min_count(),
        }
    }
}

/// Search on a single index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchQuery {
    /// ID of the searched index.
    pub index_id: String,

    /// Fulltext keywords, `None` to match all items.
    #[serde(default)]
    pub keys: Option<String>,

    /// Restrict the fulltext search to these index fields.
    #[serde(default)]
    pub fulltext_fields: Option<Vec<String>>,

    #[serde(default)]
    pub conditions: ConditionGroup,

    #[serde(default)]
    pub sorts: Vec<Sort>,

    #[serde(default)]
    pub offset: usize,

    /// Maximum number of results; the backend default applies when `None`.
    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub facets: Vec<FacetRequest>,

    /// Free-form options, readable by alter hooks.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

impl SearchQuery {
    /// Create a query matching every item of an index.
    ///
    /// # Example
    ///
    /// ```
    /// use solr_search_shared::{Operator, SearchQuery, SortDirection};
    ///
    /// let query = SearchQuery::new("solr_search_index")
    ///     .keys("foo test")
    ///     .condition("type", Some("item".into()), Operator::Equal)
    ///     .sort("id", SortDirection::Asc)
    ///     .range(0, Some(10));
    /// assert_eq!(query.keys.as_deref(), Some("foo test"));
    /// ```
    pub fn new(index_id: impl Into<String>) -> Self {
        Self {
            index_id: index_id.into(),
            ..Default::default()
        }
    }

    /// Set the fulltext keywords.
    pub fn keys(mut self, keys: impl Into<String>) -> Self {
        self.keys = Some(keys.into());
        self
    }

    /// Restrict fulltext matching to the given fields.
    pub fn fulltext_fields(mut self, fields: Vec<String>) -> Self {
        self.fulltext_fields = Some(fields);
        self
    }

    /// Add a condition to the top-level group.
    pub fn condition(
        mut self,
        field: impl Into<String>,
        value: Option<FieldValue>,
        operator: Operator,
    ) -> Self {
        self.conditions = self.conditions.condition(field, value, operator);
        self
    }

    /// Add a nested group to the top-level group.
    pub fn condition_group(mut self, group: ConditionGroup) -> Self {
        self.conditions = self.conditions.group(group);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn range(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn facet(mut self, facet: FacetRequest) -> Self {
        self.facets.push(facet);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Look up an option.
    pub fn get_option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Fulltext keywords with surrounding whitespace removed, `None` if blank.
    pub fn effective_keys(&self) -> Option<&str> {
        effective_keys(self.keys.as_deref())
    }

    /// Validate the query parameters.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.index_id.trim().is_empty() {
            return Err("index_id is required".to_string());
        }
        validate_fulltext_fields(self.fulltext_fields.as_deref())?;
        for facet in &self.facets {
            if facet.field.is_empty() {
                return Err("Facet field cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

/// Search across several indexes of one server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MultiIndexQuery {
    pub index_ids: Vec<String>,
    #[serde(default)]
    pub keys: Option<String>,
    #[serde(default)]
    pub fulltext_fields: Option<Vec<String>>,
    #[serde(default)]
    pub conditions: ConditionGroup,
    #[serde(default)]
    pub sorts: Vec<Sort>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

impl MultiIndexQuery {
    pub fn new(index_ids: Vec<String>) -> Self {
        Self {
            index_ids,
            ..Default::default()
        }
    }

    pub fn keys(mut self, keys: impl Into<String>) -> Self {
        self.keys = Some(keys.into());
        self
    }

    pub fn condition(
        mut self,
        field: impl Into<String>,
        value: Option<FieldValue>,
        operator: Operator,
    ) -> Self {
        self.conditions = self.conditions.condition(field, value, operator);
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn range(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn get_option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn effective_keys(&self) -> Option<&str> {
        effective_keys(self.keys.as_deref())
    }

    /// Validate the query parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.index_ids.is_empty() {
            return Err("At least one index must be searched".to_string());
        }
        if self.index_ids.iter().any(|id| id.trim().is_empty()) {
            return Err("Index IDs cannot be empty".to_string());
        }
        validate_fulltext_fields(self.fulltext_fields.as_deref())
    }
}

fn effective_keys(keys: Option<&str>) -> Option<&str> {
    keys.map(str::trim).filter(|k| !k.is_empty())
}

fn validate_fulltext_fields(fields: Option<&[String]>) -> Result<(), String> {
    match fields {
        Some([]) => Err("fulltext_fields cannot be an empty list".to_string()),
        _ => Ok(()),
    }
}

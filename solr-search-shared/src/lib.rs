//! # Solr Search Shared
//!
//! Data structures shared between the Solr backend and the applications
//! driving it: the items handed over for indexing, the queries executed
//! against an index, and the result sets coming back.

pub mod types;

pub use types::index_item::{FieldValue, IndexItem};
pub use types::search_query::{
    Condition, ConditionGroup, ConditionItem, Conjunction, FacetRequest, MultiIndexQuery,
    Operator, SearchQuery, Sort, SortDirection, ID_FIELD, RELEVANCE_FIELD,
};
pub use types::search_result::{FacetValue, MultiResultSet, ResultItem, ResultSet};

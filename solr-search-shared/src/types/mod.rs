//! Core data structures used across the Solr search adapter.

pub mod index_item;
pub mod search_query;
pub mod search_result;

pub use index_item::{FieldValue, IndexItem};
pub use search_query::{MultiIndexQuery, SearchQuery};
pub use search_result::{MultiResultSet, ResultSet};

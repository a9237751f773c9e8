//! Apache Solr implementation of the search backend.
//!
//! The submodules are layered: data types and field mapping decide where
//! index fields live in the Solr schema, the document and query builders
//! translate items and queries using that mapping, and [`SolrBackend`] ties
//! them to the HTTP API.

mod connection_config;
mod data_types;
pub mod document_builder;
pub mod escape;
mod field_mapping;
mod provider;
pub mod query_builder;
mod request;
pub mod result_parser;

pub use connection_config::{SolrConnectionConfig, DEFAULT_BASE_URL, DEFAULT_CORE};
pub use data_types::{DataTypeInfo, DataTypeRegistry, TEXT_TYPE};
pub use field_mapping::{
    build_field_names, encode_field_key, single_value_field_name, solr_field_name, FieldMap,
    FieldMapper, IndexFieldNames, SOLR_ITEM_ID_FIELD, SOLR_SCORE_FIELD,
};
pub use provider::SolrBackend;
pub use request::{RequestMethod, SolrDocument, SolrRequest, MAX_GET_QUERY_LENGTH};

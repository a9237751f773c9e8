//! # Solr Search Repository
//!
//! This crate connects search indexes to Apache Solr. It includes the
//! backend interface and alter hooks, the Solr implementation with its
//! field mapping, document and query translation, and the
//! [`SearchService`] application code talks to.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod service;
pub mod solr;
pub mod types;
pub mod utils;

pub use config::SearchServiceConfig;
pub use errors::SearchBackendError;
pub use interfaces::{HookRegistry, SearchBackend, SolrAlterHook};
pub use service::SearchService;
pub use solr::{SolrBackend, SolrConnectionConfig};
pub use types::{BatchIndexResult, BatchIndexSummary, FieldConfig, Index, IndexOptions, Server};
pub use utils::{generate_site_hash, solr_document_id};

//! Interface definitions for the search backend.
//!
//! `SearchBackend` is the capability interface the service talks to;
//! `SolrAlterHook` is the extension point for code that needs to adjust
//! requests, field mappings, documents or results on their way through.

mod alter_hook;
mod search_backend;

pub use alter_hook::{HookRegistry, SolrAlterHook};
pub use search_backend::SearchBackend;

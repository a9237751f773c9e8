//! # Solr Search
//!
//! Command line around the Solr search repository: index items from JSON
//! files, search, delete and commit against the core configured in the
//! environment.
//!
//! ## Modules
//!
//! - [`config`]: Environment configuration and dependency initialization
//! - [`commands`]: Command line definition and command execution
//! - [`errors`]: Error types for the command line

pub mod commands;
pub mod config;
pub mod errors;

pub use commands::{run, Cli, Command};
pub use config::Dependencies;
pub use errors::AppError;

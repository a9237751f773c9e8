//! Configuration and dependency initialization.

mod dependencies;

pub use dependencies::{load_index, ConnectionMode, Dependencies, Settings};

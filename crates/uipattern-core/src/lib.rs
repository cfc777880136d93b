//! uipattern-core
//!
//! Domain types, the error taxonomy, collaborator traits, configuration and
//! the pattern corpus shared by the retrieval crates.

pub mod config;
pub mod error;
pub mod library;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use library::PatternLibrary;

//! uipattern-hybrid
//!
//! Combines lexical and semantic retrieval into one ranked, explained answer.

pub mod explain;
pub mod fusion;
pub mod query;
pub mod service;

pub use explain::Explainer;
pub use fusion::{Normalized, ScoreFusion};
pub use query::QueryBuilder;
pub use service::RetrievalService;

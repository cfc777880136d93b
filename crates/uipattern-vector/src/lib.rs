//! uipattern-vector
//!
//! Semantic retrieval: the retrying [`SemanticRetriever`], its LanceDB-backed
//! [`LanceVectorIndex`], and the [`PatternVectorWriter`] that fills the table.

pub mod index;
pub mod retriever;
pub mod schema;
pub mod table;
pub mod writer;

pub use index::LanceVectorIndex;
pub use retriever::{RetryPolicy, SemanticRetriever};
pub use writer::PatternVectorWriter;

//! uipattern-text
//!
//! Tantivy-based lexical retrieval over the pattern corpus: a weighted-field
//! document per pattern, a shared camelCase-aware tokenizer and BM25 scoring.

pub mod index;
pub mod tantivy_utils;
pub mod tokenizer;

pub use index::{LexicalRetriever, BM25_B, BM25_K1};
pub use tokenizer::{tokenize, PatternTokenizer};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Filters, SearchHit};

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hashed:d1024`).
    fn provider_id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Approximate nearest-neighbour search over pattern embeddings.
///
/// Implementations return hits tagged `RetrievalMethod::Semantic` whose score
/// is cosine similarity. A missing or unreachable index must be reported as
/// `Error::IndexUnavailable`.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn query(&self, vector: &[f32], top_k: usize, filters: &Filters) -> Result<Vec<SearchHit>>;
}

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use uipattern_core::config::SemanticSettings;
use uipattern_core::traits::{EmbeddingProvider, VectorIndex};
use uipattern_core::types::{Filters, SearchHit};
use uipattern_core::{Error, Result};

/// Bounded retry with exponential backoff for embedding calls.
///
/// Attempt `n` (1-based) that fails is followed by a sleep of
/// `base_delay * 2^(n-1)` unless it was the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(100) }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &SemanticSettings) -> Self {
        Self {
            max_attempts: settings.retry_attempts.max(1),
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Embeds natural-language queries and searches the vector index.
pub struct SemanticRetriever {
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    retry: RetryPolicy,
}

impl SemanticRetriever {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>, retry: RetryPolicy) -> Self {
        Self { provider, index, retry }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// Embed `text`, retrying provider failures per the [`RetryPolicy`].
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut attempt = 1;
        loop {
            match self.provider.embed(text).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt >= self.retry.max_attempts => {
                    return Err(Error::EmbeddingProvider(format!("gave up after {attempt} attempts: {e}")));
                }
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "embedding failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Patterns nearest to `query`, best first.
    pub async fn search(&self, query: &str, top_k: usize, filters: &Filters) -> Result<Vec<SearchHit>> {
        let vector = self.embed(query).await?;
        let mut hits = self.index.query(&vector, top_k, filters).await?;
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(top_k);
        debug!(hits = hits.len(), filters = filters.len(), "semantic search");
        Ok(hits)
    }
}

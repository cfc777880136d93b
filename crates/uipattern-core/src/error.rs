use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Requirements rejected before any retrieval runs.
    #[error("Invalid requirements: {0}")]
    Validation(String),

    /// The vector index is missing or cannot be reached.
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// The embedding provider kept failing after all retry attempts.
    #[error("Embedding provider failed: {0}")]
    EmbeddingProvider(String),

    #[error("Invalid fusion configuration: {0}")]
    FusionConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid pattern corpus: {0}")]
    Corpus(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Errors on the semantic branch that the service absorbs by falling back
    /// to lexical-only ranking.
    pub fn is_semantic_degradation(&self) -> bool {
        matches!(self, Error::IndexUnavailable(_) | Error::EmbeddingProvider(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

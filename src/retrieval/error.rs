use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Failures surfaced by the query pipeline
#[derive(Error, Debug)]
pub enum SearchError {
    /// Bad analyzer / ranker / pooling name, zero limit or page
    #[error("Invalid request: {0}")]
    ValidationError(String),

    /// Search backend unreachable, timed out, or returned malformed hits
    #[error("Retrieval failed: {0}")]
    RetrievalError(String),

    /// Embedding collaborator unreachable, timed out, or returned no vector
    #[error("Embedding generation failed: {0}")]
    EmbeddingError(String),
}

impl SearchError {
    /// Whether the delivery layer may retry the same request
    ///
    /// The pipeline itself never retries.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SearchError::ValidationError(_))
    }
}

impl From<EmbeddingError> for SearchError {
    fn from(e: EmbeddingError) -> Self {
        SearchError::EmbeddingError(e.to_string())
    }
}

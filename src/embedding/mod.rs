/// Query and document embedding for the rerank stage
///
/// Architecture:
/// - EmbeddingClient trait, one collaborator per embedding family
/// - HttpEmbeddingClient for the remote encoding service (fasttext, sbert)
/// - LocalSbertEmbedder for offline sentence embeddings (fastembed)
/// - Embedders registry keyed by family
mod http;
mod local;

pub use http::{parse_embedding_response, HttpEmbeddingClient};
pub use local::LocalSbertEmbedder;

use crate::retrieval::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding request failed: {0}")]
    RequestError(String),

    #[error("Embedding request timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding service returned an empty vector")]
    EmptyVector,

    #[error("{family} embeddings do not support {pooling} pooling")]
    UnsupportedPooling {
        family: EmbeddingFamily,
        pooling: Pooling,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Document vector families stored alongside each article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingFamily {
    #[serde(rename = "fasttext")]
    FastText,
    #[serde(rename = "sbert")]
    Sbert,
}

impl EmbeddingFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingFamily::FastText => "fasttext",
            EmbeddingFamily::Sbert => "sbert",
        }
    }

    /// Name of the stored vector field, e.g. `ft_vector`
    pub fn vector_field(&self) -> String {
        let short = match self {
            EmbeddingFamily::FastText => "ft",
            EmbeddingFamily::Sbert => "sbert",
        };
        format!("{}_vector", short)
    }
}

impl fmt::Display for EmbeddingFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How token vectors collapse into one query vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pooling {
    #[default]
    Mean,
    Max,
    Cls,
}

impl Pooling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pooling::Mean => "mean",
            Pooling::Max => "max",
            Pooling::Cls => "cls",
        }
    }
}

impl fmt::Display for Pooling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pooling {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Pooling::Mean),
            "max" => Ok(Pooling::Max),
            "cls" => Ok(Pooling::Cls),
            other => Err(SearchError::ValidationError(format!(
                "Unknown pooling '{}'. Supported: mean, max, cls",
                other
            ))),
        }
    }
}

/// Turns text into a dense vector of one embedding family
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Family whose document vectors this client's output is comparable with
    fn family(&self) -> EmbeddingFamily;

    /// Encode a single text
    async fn encode(&self, text: &str, pooling: Pooling) -> Result<Vec<f32>, EmbeddingError>;

    /// Encode several texts, in input order
    async fn encode_batch(
        &self,
        texts: &[String],
        pooling: Pooling,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.encode(text, pooling).await?);
        }
        Ok(vectors)
    }
}

/// Embedding collaborators keyed by family
#[derive(Clone, Default)]
pub struct Embedders {
    clients: HashMap<EmbeddingFamily, Arc<dyn EmbeddingClient>>,
}

impl Embedders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under its own family, replacing any previous one
    pub fn with(mut self, client: Arc<dyn EmbeddingClient>) -> Self {
        self.clients.insert(client.family(), client);
        self
    }

    pub fn get(&self, family: EmbeddingFamily) -> Option<Arc<dyn EmbeddingClient>> {
        self.clients.get(&family).cloned()
    }

    /// Registered families, fasttext first
    pub fn families(&self) -> Vec<EmbeddingFamily> {
        [EmbeddingFamily::FastText, EmbeddingFamily::Sbert]
            .into_iter()
            .filter(|family| self.clients.contains_key(family))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Cosine similarity in [-1, 1]; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

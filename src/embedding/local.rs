/// Offline sentence embeddings through FastEmbed
use super::{EmbeddingClient, EmbeddingError, EmbeddingFamily, Pooling};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Local sbert-family encoder
///
/// The supported sentence-transformer models are mean pooled, so only
/// `Pooling::Mean` is accepted. The model loads on first use and inference
/// runs on the blocking pool.
pub struct LocalSbertEmbedder {
    model: OnceCell<Arc<TextEmbedding>>,
    embedding_model: EmbeddingModel,
    model_name: String,
    dimension: usize,
}

impl LocalSbertEmbedder {
    /// Select a sentence-transformer model without loading it
    ///
    /// **Important**: Models are downloaded on-demand to `~/.cache/huggingface/`
    /// on first use. all-MiniLM-L6-v2 is ~90MB (384 dims).
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        let (embedding_model, dimension) = match model_name {
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
            "all-MiniLM-L12-v2" | "all-minilm-l12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
            _ => {
                return Err(EmbeddingError::InitializationError(format!(
                    "Unsupported model: {}. Supported: all-MiniLM-L6-v2, all-MiniLM-L12-v2",
                    model_name
                )));
            }
        };

        Ok(Self {
            model: OnceCell::new(),
            embedding_model,
            model_name: model_name.to_string(),
            dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn model(&self) -> Result<Arc<TextEmbedding>, EmbeddingError> {
        self.model
            .get_or_try_init(|| async {
                tracing::info!(
                    "Initializing sbert model: {} ({}D, downloaded if not cached)",
                    self.model_name,
                    self.dimension
                );

                let embedding_model = self.embedding_model.clone();
                let model = tokio::task::spawn_blocking(move || {
                    let init_options =
                        InitOptions::new(embedding_model).with_show_download_progress(true);
                    TextEmbedding::try_new(init_options)
                })
                .await
                .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?
                .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

                Ok::<_, EmbeddingError>(Arc::new(model))
            })
            .await
            .cloned()
    }

    async fn embed_blocking(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self.model().await?;
        let embeddings = tokio::task::spawn_blocking(move || model.embed(texts, None))
            .await
            .map_err(|e| EmbeddingError::RequestError(format!("embedding task failed: {}", e)))?
            .map_err(|e| EmbeddingError::RequestError(e.to_string()))?;

        for embedding in &embeddings {
            if embedding.is_empty() {
                return Err(EmbeddingError::EmptyVector);
            }
            if embedding.len() != self.dimension {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} dimensions, got {}",
                    self.dimension,
                    embedding.len()
                )));
            }
        }
        Ok(embeddings)
    }

    fn check_pooling(&self, pooling: Pooling) -> Result<(), EmbeddingError> {
        if pooling != Pooling::Mean {
            return Err(EmbeddingError::UnsupportedPooling {
                family: EmbeddingFamily::Sbert,
                pooling,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingClient for LocalSbertEmbedder {
    fn family(&self) -> EmbeddingFamily {
        EmbeddingFamily::Sbert
    }

    async fn encode(&self, text: &str, pooling: Pooling) -> Result<Vec<f32>, EmbeddingError> {
        self.check_pooling(pooling)?;
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        self.embed_blocking(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyVector)
    }

    async fn encode_batch(
        &self,
        texts: &[String],
        pooling: Pooling,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.check_pooling(pooling)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.is_empty()) {
            return Err(EmbeddingError::InvalidInput("Empty text in batch".to_string()));
        }

        self.embed_blocking(texts.to_vec()).await
    }
}

//! Client for the remote text-encoding service

use super::{EmbeddingClient, EmbeddingError, EmbeddingFamily, Pooling};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Encodes text through `POST {url}{path}`
///
/// One client per family; the family is sent as `embedding_type`.
pub struct HttpEmbeddingClient {
    http: Client,
    endpoint: String,
    family: EmbeddingFamily,
    timeout_ms: u64,
}

impl HttpEmbeddingClient {
    pub fn new(
        url: &str,
        path: &str,
        family: EmbeddingFamily,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::InitializationError(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}{}", url.trim_end_matches('/'), path),
            family,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, texts: &[String], pooling: Pooling) -> Value {
        serde_json::json!({
            "texts": texts,
            "embedding_type": self.family.as_str(),
            "pooling": pooling.as_str(),
        })
    }

    async fn post(&self, texts: &[String], pooling: Pooling) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = self.request_body(texts, pooling);
        let res = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let json: Value = res
            .error_for_status()
            .map_err(|e| self.request_error(e))?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let vectors = parse_embedding_response(&json)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    fn request_error(&self, e: reqwest::Error) -> EmbeddingError {
        if e.is_timeout() {
            EmbeddingError::Timeout(self.timeout_ms)
        } else {
            EmbeddingError::RequestError(e.to_string())
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    fn family(&self) -> EmbeddingFamily {
        self.family
    }

    async fn encode(&self, text: &str, pooling: Pooling) -> Result<Vec<f32>, EmbeddingError> {
        let vector = self
            .post(&[text.to_string()], pooling)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        if vector.is_empty() {
            return Err(EmbeddingError::EmptyVector);
        }
        Ok(vector)
    }

    async fn encode_batch(
        &self,
        texts: &[String],
        pooling: Pooling,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.post(texts, pooling).await?;
        if vectors.iter().any(|v| v.is_empty()) {
            return Err(EmbeddingError::EmptyVector);
        }
        Ok(vectors)
    }
}

/// Extract `embeddings` from a service response
pub fn parse_embedding_response(json: &Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let embeddings = json
        .get("embeddings")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            EmbeddingError::InvalidResponse("response is missing embeddings array".to_string())
        })?;

    let mut vectors = Vec::with_capacity(embeddings.len());
    for embedding in embeddings {
        let values = embedding.as_array().ok_or_else(|| {
            EmbeddingError::InvalidResponse("embedding must be an array".to_string())
        })?;
        let mut vector = Vec::with_capacity(values.len());
        for value in values {
            let number = value.as_f64().ok_or_else(|| {
                EmbeddingError::InvalidResponse("embedding value must be numeric".to_string())
            })?;
            vector.push(number as f32);
        }
        vectors.push(vector);
    }

    Ok(vectors)
}

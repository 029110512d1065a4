//! Two-stage retrieval over a [`SearchBackend`]

use super::{Hit, LexicalQuery, RetrievalRequest, SearchBackend, SearchError, VectorQuery};
use crate::embedding::{Embedders, Pooling};
use ahash::{HashSet, HashSetExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs lexical retrieval and, for vector rankers, the rerank stage
///
/// The final order is whatever the last executed stage returned.
pub struct Retriever {
    backend: Arc<dyn SearchBackend>,
    embedders: Embedders,
    search_timeout: Duration,
    embed_timeout: Duration,
}

impl Retriever {
    pub fn new(backend: Arc<dyn SearchBackend>, embedders: Embedders) -> Self {
        Self {
            backend,
            embedders,
            search_timeout: DEFAULT_TIMEOUT,
            embed_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Budget for each backend call and for each embedding call
    pub fn with_timeouts(mut self, search: Duration, embed: Duration) -> Self {
        self.search_timeout = search;
        self.embed_timeout = embed;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<Vec<Hit>, SearchError> {
        let limit = request.limit.get();
        let lexical = LexicalQuery {
            analyzer: request.analyzer,
            text: request.query.text.clone(),
            limit,
        };

        let candidates = timeout(self.search_timeout, self.backend.lexical(&lexical))
            .await
            .map_err(|_| {
                SearchError::RetrievalError(format!(
                    "lexical search timed out after {} ms",
                    self.search_timeout.as_millis()
                ))
            })??;

        tracing::debug!(
            backend = self.backend.name(),
            field = request.analyzer.field(),
            candidates = candidates.len(),
            "Lexical stage complete"
        );

        let Some(family) = request.ranker.embedding_family() else {
            return Ok(candidates);
        };
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let client = self.embedders.get(family).ok_or_else(|| {
            SearchError::EmbeddingError(format!("no {} embedding collaborator configured", family))
        })?;
        let vector = timeout(
            self.embed_timeout,
            client.encode(&request.query.text, Pooling::Mean),
        )
        .await
        .map_err(|_| {
            SearchError::EmbeddingError(format!(
                "{} encoding timed out after {} ms",
                family,
                self.embed_timeout.as_millis()
            ))
        })??;
        if vector.is_empty() {
            return Err(SearchError::EmbeddingError(format!(
                "{} encoder returned an empty vector",
                family
            )));
        }

        let rerank = VectorQuery {
            candidate_ids: candidates.iter().map(|hit| hit.doc_id.clone()).collect(),
            vector,
            vector_field: family.vector_field(),
            limit,
        };
        let reranked = timeout(self.search_timeout, self.backend.rerank(&rerank))
            .await
            .map_err(|_| {
                SearchError::RetrievalError(format!(
                    "rerank timed out after {} ms",
                    self.search_timeout.as_millis()
                ))
            })??;

        let hits = restrict_to_candidates(reranked, &candidates);
        tracing::debug!(ranker = %request.ranker, hits = hits.len(), "Rerank stage complete");
        Ok(hits)
    }
}

/// Drop hits outside the candidate set and cap at the candidate count
fn restrict_to_candidates(hits: Vec<Hit>, candidates: &[Hit]) -> Vec<Hit> {
    let mut allowed: HashSet<&str> = HashSet::with_capacity(candidates.len());
    allowed.extend(candidates.iter().map(|hit| hit.doc_id.as_str()));

    let returned = hits.len();
    let mut kept: Vec<Hit> = hits
        .into_iter()
        .filter(|hit| allowed.contains(hit.doc_id.as_str()))
        .collect();

    if kept.len() < returned {
        tracing::warn!(
            dropped = returned - kept.len(),
            "Rerank returned documents outside the candidate set"
        );
    }

    kept.truncate(candidates.len());
    kept
}

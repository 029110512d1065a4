use super::{Hit, LexicalQuery, SearchError, VectorQuery};
use async_trait::async_trait;

/// A document store able to run both retrieval stages
///
/// Hits come back ordered by engine score, highest first.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Stage 1: match text against one analyzed field
    async fn lexical(&self, query: &LexicalQuery) -> Result<Vec<Hit>, SearchError>;

    /// Stage 2: score the candidate ids by vector similarity
    async fn rerank(&self, query: &VectorQuery) -> Result<Vec<Hit>, SearchError>;
}

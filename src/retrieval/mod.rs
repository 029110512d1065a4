//! Two-stage retrieval: lexical candidates, then optional vector rerank
//!
//! Stage 1 matches the processed query against one of three analyzed text
//! fields. Stage 2 (any ranker but bm25) embeds the query and rescores only
//! the stage-1 candidates by vector similarity.

mod backend;
mod elastic;
mod error;
mod ingest;
mod local;
mod orchestrator;

pub use backend::SearchBackend;
pub use elastic::{parse_hits, ElasticsearchBackend};
pub use error::SearchError;
pub use ingest::{fill_missing_vectors, read_jsonl, DocumentRecord};
pub use local::{IndexError, LocalBackend, LocalIndex};
pub use orchestrator::Retriever;

use crate::embedding::EmbeddingFamily;
use crate::query::ProcessedQuery;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Which analyzed copy of the document text stage 1 matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    /// Standard word analyzer
    Default,
    /// Character n-grams
    NGram,
    /// Whitespace-split, lowercased
    Whitespace,
}

impl Analyzer {
    pub const ALL: [Analyzer; 3] = [Analyzer::Default, Analyzer::NGram, Analyzer::Whitespace];

    /// Indexed text field holding this analyzer's tokens
    pub fn field(&self) -> &'static str {
        match self {
            Analyzer::Default => "content",
            Analyzer::NGram => "n_gram_custom_content",
            Analyzer::Whitespace => "whitespace_custom_content",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Analyzer::Default => "default",
            Analyzer::NGram => "n_gram",
            Analyzer::Whitespace => "whitespace",
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Analyzer {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Analyzer::Default),
            "n_gram" | "ngram" => Ok(Analyzer::NGram),
            "whitespace" => Ok(Analyzer::Whitespace),
            other => Err(SearchError::ValidationError(format!(
                "Unknown analyzer '{}'. Supported: default, n_gram, whitespace",
                other
            ))),
        }
    }
}

/// Final ranking function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ranker {
    /// Lexical scores only
    #[serde(rename = "bm25")]
    Bm25,
    /// Rerank with fastText document vectors
    #[serde(rename = "fasttext")]
    FastText,
    /// Rerank with sentence-BERT document vectors
    #[serde(rename = "sbert")]
    Sbert,
}

impl Ranker {
    pub const ALL: [Ranker; 3] = [Ranker::Bm25, Ranker::FastText, Ranker::Sbert];

    /// Embedding family for rerankers; `None` for bm25
    pub fn embedding_family(&self) -> Option<EmbeddingFamily> {
        match self {
            Ranker::Bm25 => None,
            Ranker::FastText => Some(EmbeddingFamily::FastText),
            Ranker::Sbert => Some(EmbeddingFamily::Sbert),
        }
    }

    /// Document field holding the vectors this ranker compares against
    pub fn vector_field(&self) -> Option<String> {
        self.embedding_family().map(|family| family.vector_field())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ranker::Bm25 => "bm25",
            Ranker::FastText => "fasttext",
            Ranker::Sbert => "sbert",
        }
    }
}

impl fmt::Display for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ranker {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bm25" => Ok(Ranker::Bm25),
            "fasttext" | "ft" => Ok(Ranker::FastText),
            "sbert" => Ok(Ranker::Sbert),
            other => Err(SearchError::ValidationError(format!(
                "Unknown ranker '{}'. Supported: bm25, fasttext, sbert",
                other
            ))),
        }
    }
}

/// One ranked document; rank is its position in the returned sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub doc_id: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub content: String,
    pub annotation: String,
    /// Engine score for the stage that produced this hit
    pub score: f32,
}

impl Hit {
    /// Get a short preview of the content (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        match self.content.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.content[..cut]),
            None => self.content.clone(),
        }
    }
}

/// Validated retrieval parameters for one request
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalRequest {
    pub query: ProcessedQuery,
    pub analyzer: Analyzer,
    pub ranker: Ranker,
    /// Bounds the lexical stage, and therefore the whole result
    pub limit: NonZeroUsize,
}

impl RetrievalRequest {
    pub fn new(
        query: ProcessedQuery,
        analyzer: Analyzer,
        ranker: Ranker,
        limit: usize,
    ) -> Result<Self, SearchError> {
        let limit = NonZeroUsize::new(limit).ok_or_else(|| {
            SearchError::ValidationError("Result limit must be greater than 0".to_string())
        })?;
        Ok(Self {
            query,
            analyzer,
            ranker,
            limit,
        })
    }
}

/// Stage-1 request to a search backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexicalQuery {
    pub analyzer: Analyzer,
    pub text: String,
    pub limit: usize,
}

/// Stage-2 request: vector similarity restricted to candidate ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorQuery {
    pub candidate_ids: Vec<String>,
    pub vector: Vec<f32>,
    pub vector_field: String,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::StrategyKind;

    #[test]
    fn test_analyzer_parsing() {
        assert_eq!("default".parse::<Analyzer>().unwrap(), Analyzer::Default);
        assert_eq!("N_GRAM".parse::<Analyzer>().unwrap(), Analyzer::NGram);
        assert_eq!(
            "whitespace".parse::<Analyzer>().unwrap().field(),
            "whitespace_custom_content"
        );
        assert!(matches!(
            "stemmed".parse::<Analyzer>(),
            Err(SearchError::ValidationError(_))
        ));
    }

    #[test]
    fn test_ranker_vector_fields() {
        assert_eq!(Ranker::Bm25.vector_field(), None);
        assert_eq!(Ranker::FastText.vector_field().as_deref(), Some("ft_vector"));
        assert_eq!(Ranker::Sbert.vector_field().as_deref(), Some("sbert_vector"));
        assert!("bert".parse::<Ranker>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        for analyzer in Analyzer::ALL {
            let json = serde_json::to_string(&analyzer).unwrap();
            assert_eq!(json, format!("\"{}\"", analyzer));
        }
        for ranker in Ranker::ALL {
            let json = serde_json::to_string(&ranker).unwrap();
            assert_eq!(json, format!("\"{}\"", ranker));
        }
    }

    #[test]
    fn test_zero_limit_rejected() {
        let query = ProcessedQuery::new("wage", StrategyKind::Expanded);
        let result = RetrievalRequest::new(query, Analyzer::Default, Ranker::Bm25, 0);
        assert!(matches!(result, Err(SearchError::ValidationError(_))));
    }

    #[test]
    fn test_preview() {
        let hit = Hit {
            doc_id: "1".to_string(),
            title: String::new(),
            author: String::new(),
            date: String::new(),
            content: "Minimum wage rises".to_string(),
            annotation: String::new(),
            score: 1.0,
        };
        assert_eq!(hit.preview(7), "Minimum...");
        assert_eq!(hit.preview(100), "Minimum wage rises");
    }
}

//! wapo-search - query analysis and two-stage retrieval over a news collection
//!
//! Free-text queries are normalized, stopword-filtered and rewritten by
//! length: short queries are expanded with synonyms, long ones summarized
//! to their salient terms. The rewritten query is matched lexically against
//! an Elasticsearch or local tantivy index, optionally reranked by fastText
//! or sentence-BERT vector similarity, and split into fixed-size pages.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod lexicon;
pub mod pagination;
pub mod pipeline;
pub mod query;
pub mod retrieval;

pub use error::{Result, SearchAppError};

//! Elasticsearch backend over the `_search` endpoint

use super::{Hit, LexicalQuery, SearchBackend, SearchError, VectorQuery};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct ElasticsearchBackend {
    http: Client,
    search_url: String,
}

impl ElasticsearchBackend {
    pub fn new(url: &str, index: &str, timeout: Duration) -> Result<Self, SearchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::RetrievalError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            search_url: format!("{}/{}/_search", url.trim_end_matches('/'), index),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// Full-text match on the analyzer's field
    pub fn lexical_body(query: &LexicalQuery) -> Value {
        let mut field = serde_json::Map::new();
        field.insert(
            query.analyzer.field().to_string(),
            json!({ "query": query.text }),
        );
        json!({
            "size": query.limit,
            "query": { "match": Value::Object(field) },
        })
    }

    /// Candidate ids AND cosine similarity, shifted to stay non-negative
    pub fn rerank_body(query: &VectorQuery) -> Value {
        let source = format!(
            "cosineSimilarity(params.query_vector, '{}') + 1.0",
            query.vector_field
        );
        json!({
            "size": query.limit,
            "query": {
                "bool": {
                    "must": [
                        { "ids": { "values": query.candidate_ids } },
                        {
                            "script_score": {
                                "query": { "match_all": {} },
                                "script": {
                                    "source": source,
                                    "params": { "query_vector": query.vector },
                                },
                            },
                        },
                    ],
                },
            },
        })
    }

    async fn execute(&self, body: &Value) -> Result<Vec<Hit>, SearchError> {
        let res = self
            .http
            .post(&self.search_url)
            .json(body)
            .send()
            .await
            .map_err(|e| SearchError::RetrievalError(format!("Elasticsearch request failed: {}", e)))?;
        let json: Value = res
            .error_for_status()
            .map_err(|e| SearchError::RetrievalError(format!("Elasticsearch error status: {}", e)))?
            .json()
            .await
            .map_err(|e| SearchError::RetrievalError(format!("Malformed response body: {}", e)))?;

        parse_hits(&json)
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn lexical(&self, query: &LexicalQuery) -> Result<Vec<Hit>, SearchError> {
        self.execute(&Self::lexical_body(query)).await
    }

    async fn rerank(&self, query: &VectorQuery) -> Result<Vec<Hit>, SearchError> {
        if query.candidate_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.execute(&Self::rerank_body(query)).await
    }
}

/// Convert `hits.hits[]` into [`Hit`]s, keeping engine order
pub fn parse_hits(json: &Value) -> Result<Vec<Hit>, SearchError> {
    let hits = json
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .ok_or_else(|| SearchError::RetrievalError("Malformed hits: missing hits.hits".to_string()))?;

    hits.iter().map(parse_hit).collect()
}

fn parse_hit(hit: &Value) -> Result<Hit, SearchError> {
    let source = hit
        .get("_source")
        .ok_or_else(|| SearchError::RetrievalError("Malformed hit: missing _source".to_string()))?;

    let doc_id = scalar_string(source.get("doc_id"))
        .ok_or_else(|| SearchError::RetrievalError("Malformed hit: missing doc_id".to_string()))?;

    Ok(Hit {
        doc_id,
        title: text_field(source, "title"),
        author: text_field(source, "author"),
        date: text_field(source, "date"),
        content: text_field(source, "content"),
        annotation: text_field(source, "annotation"),
        score: hit.get("_score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32,
    })
}

/// Strings and numbers as text; null or absent as `None`
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(source: &Value, key: &str) -> String {
    scalar_string(source.get(key)).unwrap_or_default()
}

/// Tantivy-backed local document index
///
/// Mirrors the Elasticsearch layout: one stored `content` field plus an
/// n-gram copy and a whitespace copy, with both vector families stored as
/// JSON arrays.
use super::{DocumentRecord, Hit, LexicalQuery, SearchBackend, SearchError, VectorQuery};
use crate::embedding::cosine_similarity;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, TermSetQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED, STRING, TEXT,
};
use tantivy::tokenizer::{LowerCaser, NgramTokenizer, TextAnalyzer, TokenStream, WhitespaceTokenizer};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, TantivyError, Term};
use thiserror::Error;

const NGRAM_TOKENIZER: &str = "wapo_ngram";
const WHITESPACE_TOKENIZER: &str = "wapo_whitespace";
const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Tantivy error: {0}")]
    TantivyError(#[from] TantivyError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown vector field: {0}")]
    UnknownField(String),

    #[error("Document {doc_id} has no stored {field}")]
    MissingVector { doc_id: String, field: String },

    #[error("Vector dimension mismatch for {doc_id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        doc_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },
}

#[derive(Clone, Copy)]
struct IndexFields {
    doc_id: Field,
    title: Field,
    author: Field,
    date: Field,
    content: Field,
    annotation: Field,
    n_gram: Field,
    whitespace: Field,
    ft_vector: Field,
    sbert_vector: Field,
}

impl IndexFields {
    fn build_schema() -> (Schema, Self) {
        let mut builder = Schema::builder();

        let fields = Self {
            doc_id: builder.add_text_field("doc_id", STRING | STORED),
            title: builder.add_text_field("title", STORED),
            author: builder.add_text_field("author", STORED),
            date: builder.add_text_field("date", STORED),
            content: builder.add_text_field("content", TEXT | STORED),
            annotation: builder.add_text_field("annotation", STORED),
            n_gram: builder.add_text_field("n_gram_custom_content", analyzed(NGRAM_TOKENIZER)),
            whitespace: builder
                .add_text_field("whitespace_custom_content", analyzed(WHITESPACE_TOKENIZER)),
            ft_vector: builder.add_text_field("ft_vector", STORED),
            sbert_vector: builder.add_text_field("sbert_vector", STORED),
        };

        (builder.build(), fields)
    }

    fn from_schema(schema: &Schema) -> Result<Self, IndexError> {
        let field = |name: &str| {
            schema.get_field(name).map_err(|_| {
                IndexError::InitializationError(format!("Missing '{}' field in schema", name))
            })
        };

        Ok(Self {
            doc_id: field("doc_id")?,
            title: field("title")?,
            author: field("author")?,
            date: field("date")?,
            content: field("content")?,
            annotation: field("annotation")?,
            n_gram: field("n_gram_custom_content")?,
            whitespace: field("whitespace_custom_content")?,
            ft_vector: field("ft_vector")?,
            sbert_vector: field("sbert_vector")?,
        })
    }

    fn text(&self, name: &str) -> Option<Field> {
        match name {
            "content" => Some(self.content),
            "n_gram_custom_content" => Some(self.n_gram),
            "whitespace_custom_content" => Some(self.whitespace),
            _ => None,
        }
    }

    fn vector(&self, name: &str) -> Option<Field> {
        match name {
            "ft_vector" => Some(self.ft_vector),
            "sbert_vector" => Some(self.sbert_vector),
            _ => None,
        }
    }
}

fn analyzed(tokenizer: &str) -> TextOptions {
    TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(tokenizer)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    )
}

fn register_tokenizers(index: &Index) -> Result<(), IndexError> {
    let ngram = TextAnalyzer::builder(NgramTokenizer::new(2, 3, false)?)
        .filter(LowerCaser)
        .build();
    let whitespace = TextAnalyzer::builder(WhitespaceTokenizer::default())
        .filter(LowerCaser)
        .build();

    index.tokenizers().register(NGRAM_TOKENIZER, ngram);
    index.tokenizers().register(WHITESPACE_TOKENIZER, whitespace);
    Ok(())
}

fn stored_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Directory-backed article index
pub struct LocalIndex {
    index: Index,
    reader: IndexReader,
    fields: IndexFields,
    index_path: PathBuf,
}

impl LocalIndex {
    /// Open an existing index, or create an empty one
    pub fn new(index_path: PathBuf) -> Result<Self, IndexError> {
        if index_path.join("meta.json").exists() {
            Self::open(index_path)
        } else {
            Self::create(index_path)
        }
    }

    /// Open an existing index; fails if none exists at the path
    pub fn open(index_path: PathBuf) -> Result<Self, IndexError> {
        if !index_path.join("meta.json").exists() {
            return Err(IndexError::IndexNotFound(index_path.display().to_string()));
        }

        let index = Index::open_in_dir(&index_path)
            .map_err(|e| IndexError::InitializationError(e.to_string()))?;
        let fields = IndexFields::from_schema(&index.schema())?;
        Self::finish(index, fields, index_path)
    }

    fn create(index_path: PathBuf) -> Result<Self, IndexError> {
        std::fs::create_dir_all(&index_path)?;

        let (schema, fields) = IndexFields::build_schema();
        let index = Index::create_in_dir(&index_path, schema)
            .map_err(|e| IndexError::InitializationError(e.to_string()))?;
        Self::finish(index, fields, index_path)
    }

    fn finish(index: Index, fields: IndexFields, index_path: PathBuf) -> Result<Self, IndexError> {
        register_tokenizers(&index)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: TantivyError| IndexError::InitializationError(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            fields,
            index_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.index_path
    }

    /// Number of searchable documents
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add or replace documents by `doc_id` and commit
    pub fn insert(&self, records: &[DocumentRecord]) -> Result<usize, IndexError> {
        let f = self.fields;
        let mut writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES)?;

        for record in records {
            writer.delete_term(Term::from_field_text(f.doc_id, &record.doc_id));

            let mut document = doc!(
                f.doc_id => record.doc_id.as_str(),
                f.title => record.title.as_str(),
                f.author => record.author.as_str(),
                f.date => record.date.as_str(),
                f.content => record.content.as_str(),
                f.annotation => record.annotation.as_str(),
                f.n_gram => record.content.as_str(),
                f.whitespace => record.content.as_str()
            );
            if let Some(vector) = &record.ft_vector {
                document.add_text(f.ft_vector, serde_json::to_string(vector)?);
            }
            if let Some(vector) = &record.sbert_vector {
                document.add_text(f.sbert_vector, serde_json::to_string(vector)?);
            }

            writer.add_document(document)?;
        }

        writer.commit()?;
        self.reader.reload()?;

        tracing::info!(
            documents = records.len(),
            path = %self.index_path.display(),
            "Indexed documents"
        );
        Ok(records.len())
    }

    /// Stage 1: OR of the analyzed query terms, BM25 ordered
    pub fn lexical(&self, query: &LexicalQuery) -> Result<Vec<Hit>, IndexError> {
        let field_name = query.analyzer.field();
        let field = self
            .fields
            .text(field_name)
            .ok_or_else(|| IndexError::UnknownField(field_name.to_string()))?;

        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut terms = Vec::new();
        let mut stream = analyzer.token_stream(&query.text);
        stream.process(&mut |token| terms.push(Term::from_field_text(field, &token.text)));

        // TopDocs preallocates `limit` slots; cap at the live document count
        let searcher = self.reader.searcher();
        let limit = query.limit.min(searcher.num_docs() as usize);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let top_docs = searcher.search(
            &BooleanQuery::new_multiterms_query(terms),
            &TopDocs::with_limit(limit),
        )?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            hits.push(self.to_hit(&doc, score));
        }
        Ok(hits)
    }

    /// Stage 2: `cosine + 1.0` against stored vectors of the candidates
    pub fn rerank(&self, query: &VectorQuery) -> Result<Vec<Hit>, IndexError> {
        let field = self
            .fields
            .vector(&query.vector_field)
            .ok_or_else(|| IndexError::UnknownField(query.vector_field.clone()))?;

        if query.candidate_ids.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let limit = query.candidate_ids.len().min(searcher.num_docs() as usize);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let ids = query
            .candidate_ids
            .iter()
            .map(|id| Term::from_field_text(self.fields.doc_id, id));
        let matched = searcher.search(&TermSetQuery::new(ids), &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(matched.len());
        for (_, address) in matched {
            let doc: TantivyDocument = searcher.doc(address)?;
            let doc_id = stored_text(&doc, self.fields.doc_id);

            let stored = stored_text(&doc, field);
            if stored.is_empty() {
                return Err(IndexError::MissingVector {
                    doc_id,
                    field: query.vector_field.clone(),
                });
            }
            let vector: Vec<f32> = serde_json::from_str(&stored)?;
            if vector.len() != query.vector.len() {
                return Err(IndexError::DimensionMismatch {
                    doc_id,
                    expected: query.vector.len(),
                    actual: vector.len(),
                });
            }

            let score = cosine_similarity(&query.vector, &vector) + 1.0;
            hits.push(self.to_hit(&doc, score));
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(query.limit);
        Ok(hits)
    }

    fn to_hit(&self, doc: &TantivyDocument, score: f32) -> Hit {
        let f = self.fields;
        Hit {
            doc_id: stored_text(doc, f.doc_id),
            title: stored_text(doc, f.title),
            author: stored_text(doc, f.author),
            date: stored_text(doc, f.date),
            content: stored_text(doc, f.content),
            annotation: stored_text(doc, f.annotation),
            score,
        }
    }
}

/// [`SearchBackend`] over a [`LocalIndex`]; searches run on the blocking pool
#[derive(Clone)]
pub struct LocalBackend {
    index: Arc<LocalIndex>,
}

impl LocalBackend {
    pub fn new(index: Arc<LocalIndex>) -> Self {
        Self { index }
    }

    async fn run<F>(&self, search: F) -> Result<Vec<Hit>, SearchError>
    where
        F: FnOnce(&LocalIndex) -> Result<Vec<Hit>, IndexError> + Send + 'static,
    {
        let index = self.index.clone();
        tokio::task::spawn_blocking(move || search(&index))
            .await
            .map_err(|e| SearchError::RetrievalError(format!("search task failed: {}", e)))?
            .map_err(|e| SearchError::RetrievalError(e.to_string()))
    }
}

#[async_trait]
impl SearchBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn lexical(&self, query: &LexicalQuery) -> Result<Vec<Hit>, SearchError> {
        let query = query.clone();
        self.run(move |index| index.lexical(&query)).await
    }

    async fn rerank(&self, query: &VectorQuery) -> Result<Vec<Hit>, SearchError> {
        let query = query.clone();
        self.run(move |index| index.rerank(&query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::Analyzer;
    use tempfile::TempDir;

    fn record(doc_id: &str, content: &str, sbert: Option<Vec<f32>>) -> DocumentRecord {
        DocumentRecord {
            doc_id: doc_id.to_string(),
            title: format!("Title {}", doc_id),
            author: "Staff".to_string(),
            date: "2013-01-01".to_string(),
            content: content.to_string(),
            annotation: String::new(),
            ft_vector: None,
            sbert_vector: sbert,
        }
    }

    fn index_with(docs: &[DocumentRecord]) -> (TempDir, LocalIndex) {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::new(temp.path().join("index")).unwrap();
        index.insert(docs).unwrap();
        (temp, index)
    }

    fn lexical(analyzer: Analyzer, text: &str, limit: usize) -> LexicalQuery {
        LexicalQuery {
            analyzer,
            text: text.to_string(),
            limit,
        }
    }

    #[test]
    fn test_index_creation() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::new(temp.path().join("index")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_open_missing_index() {
        let temp = TempDir::new().unwrap();
        let result = LocalIndex::open(temp.path().join("nothing"));
        assert!(matches!(result, Err(IndexError::IndexNotFound(_))));
    }

    #[test]
    fn test_lexical_default_field() {
        let (_temp, index) = index_with(&[
            record("a", "Congress debates the minimum wage increase", None),
            record("b", "Hurricane season starts early", None),
            record("c", "Wage growth and wage stagnation", None),
        ]);

        let hits = index.lexical(&lexical(Analyzer::Default, "minimum wage", 10)).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"a"));
        assert!(ids.contains(&"c"));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(hits[0].author, "Staff");
    }

    #[test]
    fn test_lexical_respects_limit() {
        let docs: Vec<DocumentRecord> = (0..5)
            .map(|i| record(&format!("d{}", i), "minimum wage", None))
            .collect();
        let (_temp, index) = index_with(&docs);

        let hits = index.lexical(&lexical(Analyzer::Default, "wage", 3)).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_lexical_huge_limit_returns_available_hits() {
        let (_temp, index) = index_with(&[
            record("a", "minimum wage", None),
            record("b", "wage freeze", None),
            record("c", "storm season", None),
        ]);

        let hits = index
            .lexical(&lexical(Analyzer::Default, "wage", 1_000_000_000))
            .unwrap();
        assert_eq!(hits.len(), 2);

        let hits = index
            .lexical(&lexical(Analyzer::Default, "wage", usize::MAX / 4))
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_lexical_on_empty_index() {
        let temp = TempDir::new().unwrap();
        let index = LocalIndex::new(temp.path().join("index")).unwrap();

        let hits = index
            .lexical(&lexical(Analyzer::Default, "wage", 1_000_000_000))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ngram_field_matches_partial_words() {
        let (_temp, index) = index_with(&[
            record("a", "Minimum wages rose", None),
            record("b", "Storms", None),
        ]);

        let hits = index.lexical(&lexical(Analyzer::NGram, "wag", 10)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "a");
    }

    #[test]
    fn test_whitespace_field_keeps_punctuation() {
        let (_temp, index) = index_with(&[
            record("a", "Raise wages, now", None),
            record("b", "Raise wages now", None),
        ]);

        let hits = index.lexical(&lexical(Analyzer::Whitespace, "WAGES,", 10)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "a");
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let (_temp, index) = index_with(&[record("a", "minimum wage", None)]);
        let hits = index.lexical(&lexical(Analyzer::Default, "", 10)).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_insert_replaces_by_doc_id() {
        let (_temp, index) = index_with(&[record("a", "old text", None)]);
        index.insert(&[record("a", "new text", None)]).unwrap();

        assert_eq!(index.len(), 1);
        let hits = index.lexical(&lexical(Analyzer::Default, "new", 10)).unwrap();
        assert_eq!(hits[0].content, "new text");
    }

    #[test]
    fn test_rerank_restricted_to_candidates() {
        let (_temp, index) = index_with(&[
            record("a", "wage", Some(vec![1.0, 0.0])),
            record("b", "wage", Some(vec![0.0, 1.0])),
            record("c", "wage", Some(vec![1.0, 0.1])),
        ]);

        let hits = index
            .rerank(&VectorQuery {
                candidate_ids: vec!["a".to_string(), "b".to_string()],
                vector: vec![0.0, 1.0],
                vector_field: "sbert_vector".to_string(),
                limit: 10,
            })
            .unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!((hits[0].score - 2.0).abs() < 1e-5);
        assert!((hits[1].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rerank_missing_vector() {
        let (_temp, index) = index_with(&[record("a", "wage", None)]);
        let result = index.rerank(&VectorQuery {
            candidate_ids: vec!["a".to_string()],
            vector: vec![1.0],
            vector_field: "ft_vector".to_string(),
            limit: 1,
        });
        assert!(matches!(result, Err(IndexError::MissingVector { .. })));
    }

    #[test]
    fn test_reopen_keeps_documents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index");
        {
            let index = LocalIndex::new(path.clone()).unwrap();
            index.insert(&[record("a", "minimum wage", None)]).unwrap();
        }

        let index = LocalIndex::open(path).unwrap();
        assert_eq!(index.len(), 1);
        let hits = index.lexical(&lexical(Analyzer::NGram, "wage", 10)).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_backend_runs_both_stages() {
        let (_temp, index) = index_with(&[
            record("a", "minimum wage", Some(vec![1.0, 0.0])),
            record("b", "wage floor", Some(vec![0.0, 1.0])),
        ]);
        let backend = LocalBackend::new(Arc::new(index));

        let hits = backend
            .lexical(&lexical(Analyzer::Default, "wage", 10))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let reranked = backend
            .rerank(&VectorQuery {
                candidate_ids: hits.iter().map(|h| h.doc_id.clone()).collect(),
                vector: vec![0.0, 1.0],
                vector_field: "sbert_vector".to_string(),
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(reranked[0].doc_id, "b");
    }
}

//! End-to-end request flow: analyze, retrieve, paginate
//!
//! Shared components are built once from [`Config`] and reused across
//! requests; each request gets its own id and tracing span.

use crate::config::{expand_path, BackendConfig, BackendKind, Config, EmbeddingConfig, EmbeddingMode};
use crate::embedding::{EmbeddingFamily, Embedders, HttpEmbeddingClient, LocalSbertEmbedder};
use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::pagination::ResultPages;
use crate::query::{Gazetteer, ProcessedQuery, QueryAnalyzer};
use crate::retrieval::{
    Analyzer, ElasticsearchBackend, LocalBackend, LocalIndex, Ranker, RetrievalRequest, Retriever,
    SearchBackend, SearchError,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// One user search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub analyzer: Analyzer,
    pub ranker: Ranker,
    pub limit: usize,
}

/// Processed query plus paginated hits
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub request_id: Uuid,
    pub query: String,
    pub processed: ProcessedQuery,
    pub analyzer: Analyzer,
    pub ranker: Ranker,
    pub results: ResultPages,
    pub elapsed_ms: u64,
}

pub struct SearchPipeline {
    analyzer: QueryAnalyzer,
    retriever: Retriever,
    page_size: usize,
}

impl SearchPipeline {
    pub fn new(analyzer: QueryAnalyzer, retriever: Retriever, page_size: usize) -> Self {
        Self {
            analyzer,
            retriever,
            page_size,
        }
    }

    /// Wire lexicon, backend and embedders as configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let analyzer = build_query_analyzer(config)?;
        let backend = build_backend(&config.backend)?;
        let embedders = build_embedders(&config.embedding)?;

        tracing::debug!(
            backend = backend.name(),
            embedders = ?embedders.families(),
            "Search pipeline ready"
        );

        let retriever = Retriever::new(backend, embedders).with_timeouts(
            Duration::from_millis(config.backend.timeout_ms),
            Duration::from_millis(config.embedding.timeout_ms),
        );

        Ok(Self::new(analyzer, retriever, config.pipeline.page_size))
    }

    pub fn query_analyzer(&self) -> &QueryAnalyzer {
        &self.analyzer
    }

    /// Run one request end to end
    pub async fn search(&self, request: &SearchRequest) -> std::result::Result<SearchResponse, SearchError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("search", request_id = %request_id);

        async move {
            let started = Instant::now();

            let processed = self.analyzer.process(&request.query);
            let retrieval = RetrievalRequest::new(
                processed.clone(),
                request.analyzer,
                request.ranker,
                request.limit,
            )?;
            let hits = self.retriever.retrieve(&retrieval).await?;
            let results = ResultPages::paginate(hits, self.page_size);
            let elapsed_ms = started.elapsed().as_millis() as u64;

            tracing::info!(
                strategy = %processed.strategy,
                analyzer = %request.analyzer,
                ranker = %request.ranker,
                total = results.total(),
                elapsed_ms,
                "Search complete"
            );

            Ok(SearchResponse {
                request_id,
                query: request.query.clone(),
                processed,
                analyzer: request.analyzer,
                ranker: request.ranker,
                results,
                elapsed_ms,
            })
        }
        .instrument(span)
        .await
    }
}

/// Query analyzer from the lexicon and pipeline sections
pub fn build_query_analyzer(config: &Config) -> Result<QueryAnalyzer> {
    let mut lexicon_config = config.lexicon.clone();
    for path in [
        &mut lexicon_config.stopwords_file,
        &mut lexicon_config.synonyms_file,
        &mut lexicon_config.lemmas_file,
        &mut lexicon_config.entities_file,
    ]
    .into_iter()
    .flatten()
    {
        *path = expand_path(path)?;
    }

    let lexicon = Lexicon::from_config(&lexicon_config)?;
    let gazetteer = Arc::new(Gazetteer::with_extra_keywords(&config.lexicon.extra_keywords));
    Ok(QueryAnalyzer::new(&lexicon, gazetteer, &config.pipeline))
}

pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn SearchBackend>> {
    let backend: Arc<dyn SearchBackend> = match config.kind {
        BackendKind::Elasticsearch => Arc::new(ElasticsearchBackend::new(
            &config.url,
            &config.index,
            Duration::from_millis(config.timeout_ms),
        )?),
        BackendKind::Local => {
            let index = LocalIndex::open(expand_path(&config.index_dir)?)?;
            Arc::new(LocalBackend::new(Arc::new(index)))
        }
    };
    Ok(backend)
}

/// Online mode serves both families remotely; offline mode only sbert
pub fn build_embedders(config: &EmbeddingConfig) -> Result<Embedders> {
    let embedders = match config.mode {
        EmbeddingMode::Online => {
            let timeout = Duration::from_millis(config.timeout_ms);
            let mut embedders = Embedders::new();
            for family in [EmbeddingFamily::FastText, EmbeddingFamily::Sbert] {
                embedders = embedders.with(Arc::new(HttpEmbeddingClient::new(
                    &config.url,
                    &config.path,
                    family,
                    timeout,
                )?));
            }
            embedders
        }
        EmbeddingMode::Offline => {
            Embedders::new().with(Arc::new(LocalSbertEmbedder::new(&config.local_model)?))
        }
    };
    Ok(embedders)
}

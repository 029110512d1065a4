//! End-to-end search integration over a local tantivy index
//!
//! Builds an index from JSON Lines in a temp directory, then runs the full
//! pipeline: query analysis, lexical retrieval, optional rerank, pagination.

use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wapo_search::config::{BackendKind, Config};
use wapo_search::embedding::{
    EmbeddingClient, EmbeddingError, EmbeddingFamily, Embedders, Pooling,
};
use wapo_search::pipeline::{build_query_analyzer, SearchPipeline, SearchRequest};
use wapo_search::query::StrategyKind;
use wapo_search::retrieval::{
    read_jsonl, Analyzer, LocalBackend, LocalIndex, Ranker, Retriever, SearchError,
};

/// Encodes every query to the same fixed vector
struct FixedSbert(Vec<f32>);

#[async_trait]
impl EmbeddingClient for FixedSbert {
    fn family(&self) -> EmbeddingFamily {
        EmbeddingFamily::Sbert
    }

    async fn encode(&self, _text: &str, _pooling: Pooling) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.0.clone())
    }
}

fn write_corpus(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("articles.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();

    let mut articles = vec![
        serde_json::json!({
            "doc_id": "texas-1",
            "title": "Texas weighs raise",
            "author": "Staff",
            "date": 1388552400000_i64,
            "content": "Texas raises minimum wage for workers",
            "sbert_vector": [0.0, 1.0],
        }),
        serde_json::json!({
            "doc_id": "storm-1",
            "title": "Storm season",
            "content": "Hurricane season begins along the coast",
            "sbert_vector": [0.0, 1.0],
        }),
    ];
    for i in 0..18 {
        // Vectors drift from [1, 0] toward [0, 1] as i grows
        let angle = (i as f32) / 17.0 * std::f32::consts::FRAC_PI_2;
        articles.push(serde_json::json!({
            "doc_id": format!("wage-{:02}", i),
            "title": format!("Wage report {}", i),
            "author": "Desk",
            "date": "2014-01-01",
            "content": format!("The wage debate continues in part {}", i),
            "sbert_vector": [angle.cos(), angle.sin()],
        }));
    }

    for article in articles {
        writeln!(file, "{}", article).unwrap();
    }
    path
}

/// Index the corpus and return a config pointing at it
fn indexed_config(temp: &TempDir) -> Config {
    let corpus = write_corpus(temp.path());
    let records = read_jsonl(&corpus).unwrap();
    assert_eq!(records.len(), 20);

    let index_dir = temp.path().join("index");
    LocalIndex::new(index_dir.clone())
        .unwrap()
        .insert(&records)
        .unwrap();

    let mut config = Config::default();
    config.backend.kind = BackendKind::Local;
    config.backend.index_dir = index_dir;
    config
}

fn request(query: &str, ranker: Ranker, limit: usize) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        analyzer: Analyzer::Default,
        ranker,
        limit,
    }
}

#[tokio::test]
async fn test_bm25_search_paginates_all_matches() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);
    let pipeline = SearchPipeline::from_config(&config).unwrap();

    let response = pipeline
        .search(&request("wage", Ranker::Bm25, 50))
        .await
        .unwrap();
    let results = &response.results;

    assert_eq!(response.processed.strategy, StrategyKind::Expanded);
    assert_eq!(results.total(), 19);
    assert_eq!(results.page_count(), 3);
    assert_eq!(results.page(1).unwrap().len(), 8);
    assert_eq!(results.page(3).unwrap().len(), 3);
    assert!(!results.is_last_page(2));
    assert!(results.is_last_page(3));
    assert!(results.get("storm-1").is_none());
    assert_eq!(results.get("texas-1").unwrap().author, "Staff");

    println!("✓ {} hits over {} pages", results.total(), results.page_count());
}

#[tokio::test]
async fn test_limit_bounds_results() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);
    let pipeline = SearchPipeline::from_config(&config).unwrap();

    let response = pipeline
        .search(&request("wage", Ranker::Bm25, 5))
        .await
        .unwrap();
    assert_eq!(response.results.total(), 5);
    assert_eq!(response.results.page_count(), 1);
}

#[tokio::test]
async fn test_huge_limit_returns_every_match() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);
    let pipeline = SearchPipeline::from_config(&config).unwrap();

    let response = pipeline
        .search(&request("wage", Ranker::Bm25, 1_000_000_000))
        .await
        .unwrap();
    assert_eq!(response.results.total(), 19);
}

#[tokio::test]
async fn test_passthrough_query_ranks_best_match_first() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);
    let pipeline = SearchPipeline::from_config(&config).unwrap();

    let response = pipeline
        .search(&request(
            "Should Texas raise its minimum wage for Workers",
            Ranker::Bm25,
            20,
        ))
        .await
        .unwrap();

    assert_eq!(response.processed.strategy, StrategyKind::Passthrough);
    assert_eq!(response.processed.text, "texas raise minimum wage worker");
    assert_eq!(response.results.page(1).unwrap()[0].doc_id, "texas-1");
}

#[tokio::test]
async fn test_no_match_is_single_empty_page() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);
    let pipeline = SearchPipeline::from_config(&config).unwrap();

    let response = pipeline
        .search(&request("zebra", Ranker::Bm25, 20))
        .await
        .unwrap();

    assert_eq!(response.results.total(), 0);
    assert_eq!(response.results.page_count(), 1);
    assert!(response.results.page(1).unwrap().is_empty());
}

#[tokio::test]
async fn test_each_analyzer_finds_the_article() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);
    let pipeline = SearchPipeline::from_config(&config).unwrap();

    for analyzer in Analyzer::ALL {
        let response = pipeline
            .search(&SearchRequest {
                query: "hurricane".to_string(),
                analyzer,
                ranker: Ranker::Bm25,
                limit: 10,
            })
            .await
            .unwrap();

        let page = response.results.page(1).unwrap();
        assert!(!page.is_empty(), "analyzer {}", analyzer);
        assert_eq!(page[0].doc_id, "storm-1", "analyzer {}", analyzer);
    }
}

#[tokio::test]
async fn test_sbert_rerank_stays_within_candidates() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);

    let index = LocalIndex::open(config.backend.index_dir.clone()).unwrap();
    let retriever = Retriever::new(
        Arc::new(LocalBackend::new(Arc::new(index))),
        Embedders::new().with(Arc::new(FixedSbert(vec![0.0, 1.0]))),
    );
    let pipeline = SearchPipeline::new(
        build_query_analyzer(&config).unwrap(),
        retriever,
        config.pipeline.page_size,
    );

    let lexical = pipeline
        .search(&request("wage", Ranker::Bm25, 50))
        .await
        .unwrap();
    let reranked = pipeline
        .search(&request("wage", Ranker::Sbert, 50))
        .await
        .unwrap();

    let hits: Vec<_> = reranked.results.hits().collect();
    assert_eq!(hits.len(), lexical.results.total());

    // storm-1 has a perfect vector but never matched lexically
    assert!(hits.iter().all(|h| h.doc_id != "storm-1"));
    assert!(hits.iter().all(|h| lexical.results.get(&h.doc_id).is_some()));

    // cosine + 1.0, descending: texas-1 and wage-17 share the query vector
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!((hits[0].score - 2.0).abs() < 1e-4);
    assert_eq!(hits.last().unwrap().doc_id, "wage-00");

    println!("✓ Reranked {} candidates", hits.len());
}

#[tokio::test]
async fn test_fasttext_without_vectors_fails_with_retrieval_error() {
    let temp = TempDir::new().unwrap();
    let config = indexed_config(&temp);

    struct FixedFastText;

    #[async_trait]
    impl EmbeddingClient for FixedFastText {
        fn family(&self) -> EmbeddingFamily {
            EmbeddingFamily::FastText
        }

        async fn encode(&self, _text: &str, _pooling: Pooling) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }
    }

    let index = LocalIndex::open(config.backend.index_dir.clone()).unwrap();
    let pipeline = SearchPipeline::new(
        build_query_analyzer(&config).unwrap(),
        Retriever::new(
            Arc::new(LocalBackend::new(Arc::new(index))),
            Embedders::new().with(Arc::new(FixedFastText)),
        ),
        8,
    );

    // The corpus carries no ft_vector
    let result = pipeline.search(&request("wage", Ranker::FastText, 10)).await;
    assert!(matches!(result, Err(SearchError::RetrievalError(_))));
}

#[tokio::test]
async fn test_unreachable_elasticsearch_is_retryable() {
    let mut config = Config::default();
    config.backend.kind = BackendKind::Elasticsearch;
    config.backend.url = "http://127.0.0.1:9".to_string();
    config.backend.timeout_ms = 500;
    let pipeline = SearchPipeline::from_config(&config).unwrap();

    let err = pipeline
        .search(&request("minimum wage", Ranker::Bm25, 10))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::RetrievalError(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
#[ignore] // Requires model download (~90MB) - run with: cargo test -- --ignored
async fn test_offline_sbert_end_to_end() {
    use wapo_search::pipeline::build_embedders;
    use wapo_search::retrieval::fill_missing_vectors;

    let temp = TempDir::new().unwrap();
    let mut records = read_jsonl(&write_corpus(temp.path())).unwrap();
    for record in &mut records {
        record.sbert_vector = None;
    }

    let config = Config::default();
    let embedders = build_embedders(&config.embedding).unwrap();
    let filled = fill_missing_vectors(&mut records, &embedders).await.unwrap();
    assert_eq!(filled, 20);

    let mut config = config;
    config.backend.index_dir = temp.path().join("index");
    LocalIndex::new(config.backend.index_dir.clone())
        .unwrap()
        .insert(&records)
        .unwrap();

    let pipeline = SearchPipeline::from_config(&config).unwrap();
    let response = pipeline
        .search(&request("Should Texas raise its minimum wage for Workers", Ranker::Sbert, 20))
        .await
        .unwrap();

    assert_eq!(response.results.page(1).unwrap()[0].doc_id, "texas-1");
}

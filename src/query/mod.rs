//! Query analysis: turns a raw user query into a retrieval-ready string
//!
//! raw -> Normalizer -> FilteredQuery -> StrategySelector ->
//! (QueryExpander | QuerySummarizer | passthrough) -> ProcessedQuery

mod expander;
mod filter;
mod frequency;
mod gazetteer;
mod normalizer;
mod strategy;
mod summarizer;

pub use expander::QueryExpander;
pub use filter::FilteredQuery;
pub use frequency::{frequent_terms, summarize_by_frequency, DEFAULT_FREQUENCY_SCALAR};
pub use gazetteer::{Gazetteer, TOPIC_KEYWORDS, US_STATES};
pub use normalizer::{NormalizedQuery, Normalizer};
pub use strategy::{Strategy, StrategyKind, StrategySelector};
pub use summarizer::{QuerySummarizer, SALIENT_LABELS};

use crate::config::{PipelineConfig, SummaryMethod};
use crate::lexicon::{Lexicon, StopwordSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The string handed to retrieval, tagged with how it was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedQuery {
    pub text: String,
    pub strategy: StrategyKind,
}

impl ProcessedQuery {
    pub fn new(text: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            text: text.into(),
            strategy,
        }
    }
}

/// Every intermediate form of one analyzed query
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnalysis {
    pub raw: String,
    pub normalized: NormalizedQuery,
    pub filtered: FilteredQuery,
    pub strategy: Strategy,
    pub processed: ProcessedQuery,
}

/// Stateless query analyzer; one instance serves all requests
#[derive(Clone)]
pub struct QueryAnalyzer {
    normalizer: Normalizer,
    stopwords: Arc<StopwordSet>,
    selector: StrategySelector,
    expander: QueryExpander,
    summarizer: QuerySummarizer,
    summary_method: SummaryMethod,
    frequency_scalar: f32,
}

impl QueryAnalyzer {
    pub fn new(lexicon: &Lexicon, gazetteer: Arc<Gazetteer>, config: &PipelineConfig) -> Self {
        Self {
            normalizer: Normalizer::new(lexicon.lemmas.clone()),
            stopwords: lexicon.stopwords.clone(),
            selector: StrategySelector::new(config.expand_max_terms, config.summarize_min_terms),
            expander: QueryExpander::new(lexicon.synonyms.clone()),
            summarizer: QuerySummarizer::new(lexicon.entities.clone(), gazetteer),
            summary_method: config.summarizer,
            frequency_scalar: config.frequency_scalar,
        }
    }

    /// Run the full analysis, keeping intermediate forms
    pub fn analyze(&self, raw: &str) -> QueryAnalysis {
        let normalized = self.normalizer.normalize(raw);
        let filtered = FilteredQuery::from_normalized(&normalized, &self.stopwords);
        let strategy = self.selector.select(&filtered);
        let processed = self.apply(&strategy);

        tracing::debug!(
            filtered_terms = filtered.len(),
            strategy = %processed.strategy,
            processed = %processed.text,
            "Query analyzed"
        );

        QueryAnalysis {
            raw: raw.to_string(),
            normalized,
            filtered,
            strategy,
            processed,
        }
    }

    /// Processed query only
    pub fn process(&self, raw: &str) -> ProcessedQuery {
        self.analyze(raw).processed
    }

    fn apply(&self, strategy: &Strategy) -> ProcessedQuery {
        let text = match strategy {
            Strategy::Expand { terms } => self.expander.expand(terms),
            Strategy::Summarize { terms, original } => match self.summary_method {
                SummaryMethod::Entities => self.summarizer.summarize(terms, original),
                SummaryMethod::Frequency => summarize_by_frequency(terms, self.frequency_scalar),
            },
            Strategy::Passthrough { terms } => terms.join(" "),
        };
        ProcessedQuery::new(text, strategy.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn analyzer_with(method: SummaryMethod) -> QueryAnalyzer {
        let mut config = Config::default();
        config.pipeline.summarizer = method;
        QueryAnalyzer::new(
            &Lexicon::builtin().unwrap(),
            Arc::new(Gazetteer::builtin()),
            &config.pipeline,
        )
    }

    #[test]
    fn test_short_query_expands() {
        let processed = analyzer_with(SummaryMethod::Entities).process("minimum wage");
        assert_eq!(processed.strategy, StrategyKind::Expanded);
        assert!(processed.text.split(' ').any(|t| t == "lowest"));
    }

    #[test]
    fn test_medium_query_passes_through() {
        let processed = analyzer_with(SummaryMethod::Entities)
            .process("Should Texas raise its minimum wage for Workers");
        assert_eq!(processed.strategy, StrategyKind::Passthrough);
        assert_eq!(processed.text, "texas raise minimum wage worker");
    }

    #[test]
    fn test_long_query_summarizes() {
        let analysis = analyzer_with(SummaryMethod::Entities).analyze(
            "the federal government increased the minimum wage for contract workers across the united states this year",
        );
        assert_eq!(analysis.processed.strategy, StrategyKind::Summarized);
        assert_eq!(
            analysis.processed.text,
            "united states federal government increase minimum wage contract worker states"
        );
    }

    #[test]
    fn test_frequency_method() {
        let processed = analyzer_with(SummaryMethod::Frequency)
            .process("wage wage wage law law texas ohio city town village");
        assert_eq!(processed.strategy, StrategyKind::Summarized);
        assert_eq!(processed.text, "wage law");
    }

    #[test]
    fn test_only_stopwords() {
        let processed = analyzer_with(SummaryMethod::Entities).process("the of and to");
        assert_eq!(processed, ProcessedQuery::new("", StrategyKind::Expanded));
    }
}

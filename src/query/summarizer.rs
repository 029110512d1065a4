//! Extractive summarization for long queries
//!
//! Keeps salient named entities first, then gazetteer terms, each at most
//! once and in first-seen order.

use crate::lexicon::{EntityLabel, EntityRecognizer};
use crate::query::Gazetteer;
use std::sync::Arc;

/// Entity categories that carry retrieval signal
pub const SALIENT_LABELS: &[EntityLabel] = &[
    EntityLabel::Person,
    EntityLabel::Gpe,
    EntityLabel::Norp,
    EntityLabel::Org,
    EntityLabel::Time,
    EntityLabel::Cardinal,
    EntityLabel::Money,
    EntityLabel::Event,
];

#[derive(Clone)]
pub struct QuerySummarizer {
    recognizer: Arc<dyn EntityRecognizer>,
    gazetteer: Arc<Gazetteer>,
}

impl QuerySummarizer {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, gazetteer: Arc<Gazetteer>) -> Self {
        Self {
            recognizer,
            gazetteer,
        }
    }

    /// Salient terms of a long query
    ///
    /// # Arguments
    /// * `terms` - Filtered lowercase tokens
    /// * `original` - Filtered original-case text, used for entity recognition
    pub fn summarize_terms(&self, terms: &[String], original: &str) -> Vec<String> {
        let mut summary: Vec<String> = Vec::new();

        for entity in self.recognizer.recognize(original) {
            if !SALIENT_LABELS.contains(&entity.label) {
                continue;
            }
            let text = entity.text.to_lowercase();
            if !summary.contains(&text) {
                summary.push(text);
            }
        }

        for term in terms {
            if self.gazetteer.contains(term) && !summary.contains(term) {
                summary.push(term.clone());
            }
        }

        summary
    }

    pub fn summarize(&self, terms: &[String], original: &str) -> String {
        let summary = self.summarize_terms(terms, original);
        tracing::debug!(
            terms = terms.len(),
            kept = summary.len(),
            "Summarized query"
        );
        summary.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{Entity, PatternEntityRecognizer, StopwordSet};
    use crate::query::FilteredQuery;

    fn summarizer() -> QuerySummarizer {
        QuerySummarizer::new(
            Arc::new(PatternEntityRecognizer::builtin().unwrap()),
            Arc::new(Gazetteer::builtin()),
        )
    }

    struct FixedRecognizer(Vec<Entity>);

    impl EntityRecognizer for FixedRecognizer {
        fn recognize(&self, _text: &str) -> Vec<Entity> {
            self.0.clone()
        }
    }

    fn entity(text: &str, label: EntityLabel) -> Entity {
        Entity {
            text: text.to_string(),
            label,
            start: 0,
            end: text.len(),
        }
    }

    #[test]
    fn test_federal_wage_query() {
        let filtered = FilteredQuery::from_text(
            "the federal government increased the minimum wage for contract workers across the united states this year",
            &StopwordSet::builtin(),
        );
        let summary = summarizer().summarize_terms(&filtered.lower, &filtered.original);

        assert_eq!(summary[0], "united states");
        let position = |t: &str| summary.iter().position(|s| s == t);
        for expected in ["federal", "government", "minimum", "wage", "contract"] {
            assert!(position(expected).is_some(), "missing {}", expected);
        }
        assert!(position("federal") < position("government"));
        assert!(position("minimum") < position("wage"));
        assert!(position("year").is_none());
    }

    #[test]
    fn test_entities_precede_gazetteer_terms() {
        let summarizer = QuerySummarizer::new(
            Arc::new(FixedRecognizer(vec![
                entity("Obama", EntityLabel::Person),
                entity("2014", EntityLabel::Date),
                entity("Wage", EntityLabel::Org),
            ])),
            Arc::new(Gazetteer::builtin()),
        );
        let terms: Vec<String> = ["wage", "law", "wage", "salary"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        // DATE is dropped; "wage" from the ORG entity is not repeated
        assert_eq!(
            summarizer.summarize_terms(&terms, "ignored"),
            vec!["obama", "wage", "law"]
        );
    }

    #[test]
    fn test_no_duplicates() {
        let filtered = FilteredQuery::from_text(
            "wage wage law law Texas Texas state state federal",
            &StopwordSet::builtin(),
        );
        let summary = summarizer().summarize_terms(&filtered.lower, &filtered.original);
        let mut seen = std::collections::HashSet::new();
        for term in &summary {
            assert!(seen.insert(term), "duplicate {}", term);
        }
    }

    #[test]
    fn test_nothing_salient() {
        let terms: Vec<String> = ["apple", "banana", "cherry"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(summarizer().summarize(&terms, "apple banana cherry"), "");
    }
}

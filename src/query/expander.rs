//! Synonym expansion for short queries

use crate::lexicon::SynonymLexicon;
use ahash::{HashSet, HashSetExt};
use std::sync::Arc;

/// Characters that join the words of a multi-word lemma
fn is_word_separator(c: char) -> bool {
    c == '_' || c.is_whitespace()
}

/// Builds a bag of single-word synonyms for a list of terms
#[derive(Clone)]
pub struct QueryExpander {
    lexicon: Arc<dyn SynonymLexicon>,
}

impl QueryExpander {
    pub fn new(lexicon: Arc<dyn SynonymLexicon>) -> Self {
        Self { lexicon }
    }

    /// Deduplicated, case-folded single-word synonyms of every term
    ///
    /// Iteration order of the returned set is unspecified.
    pub fn synonym_bag(&self, terms: &[String]) -> HashSet<String> {
        let mut bag = HashSet::new();
        for term in terms {
            for synonym in self.lexicon.synonyms(term) {
                if synonym.is_empty() || synonym.contains(is_word_separator) {
                    continue;
                }
                bag.insert(synonym.to_lowercase());
            }
        }
        bag
    }

    /// Space-joined synonym bag; empty when no term has synonyms
    pub fn expand(&self, terms: &[String]) -> String {
        let bag = self.synonym_bag(terms);
        tracing::debug!(terms = terms.len(), synonyms = bag.len(), "Expanded query");
        bag.into_iter().collect::<Vec<_>>().join(" ")
    }
}

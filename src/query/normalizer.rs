//! Per-term query normalization

use crate::lexicon::LemmaTable;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Raw query after normalization; one term per raw term, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedQuery {
    terms: Vec<String>,
}

impl NormalizedQuery {
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn as_string(&self) -> String {
        self.terms.join(" ")
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Maps each term to its canonical lemma, leaving unknown terms untouched
#[derive(Clone)]
pub struct Normalizer {
    lemmas: Arc<LemmaTable>,
}

impl Normalizer {
    pub fn new(lemmas: Arc<LemmaTable>) -> Self {
        Self { lemmas }
    }

    /// Normalize a raw query split on single spaces
    ///
    /// Empty terms (from repeated spaces) are kept, so the term count and
    /// spacing of the input survive.
    pub fn normalize(&self, raw: &str) -> NormalizedQuery {
        let terms = raw.split(' ').map(|term| self.normalize_term(term)).collect();
        NormalizedQuery { terms }
    }

    pub fn normalize_term(&self, term: &str) -> String {
        if term.is_empty() {
            return String::new();
        }
        match self.lemmas.lookup(term) {
            Some(lemma) => lemma.to_string(),
            None => term.to_string(),
        }
    }
}

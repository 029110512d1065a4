// Punctuation stripping, tokenization and stopword removal
use crate::lexicon::{strip_punctuation, tokenize, StopwordSet};
use crate::query::NormalizedQuery;
use serde::Serialize;

/// Content terms of a normalized query, in two parallel forms
///
/// `lower` feeds lexicon lookups; `original` keeps the user's casing for
/// entity recognition. Both come from the same token stream, so they
/// always hold the same number of terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredQuery {
    pub lower: Vec<String>,
    pub original: String,
}

impl FilteredQuery {
    pub fn from_normalized(query: &NormalizedQuery, stopwords: &StopwordSet) -> Self {
        Self::from_text(&query.as_string(), stopwords)
    }

    pub fn from_text(text: &str, stopwords: &StopwordSet) -> Self {
        let stripped = strip_punctuation(text);

        let mut lower = Vec::new();
        let mut original = Vec::new();
        for token in tokenize(&stripped) {
            let folded = token.to_lowercase();
            if stopwords.contains(&folded) {
                continue;
            }
            lower.push(folded);
            original.push(token);
        }

        Self {
            lower,
            original: original.join(" "),
        }
    }

    /// Number of content terms, which drives strategy selection
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}

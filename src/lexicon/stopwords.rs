// English stopword set, fixed at initialization
use ahash::{HashSet, HashSetExt};
use std::path::Path;

use super::{read_data_file, LexiconError};

const BUILTIN_STOPWORDS: &str = include_str!("../../data/stopwords.txt");

/// Stopword set with case-insensitive membership
#[derive(Debug, Clone)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    /// The built-in English list (one word per line)
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_STOPWORDS)
    }

    /// Load a newline-separated list; blank lines and `#` comments are skipped
    pub fn from_file(path: &Path) -> Result<Self, LexiconError> {
        Ok(Self::parse(&read_data_file(path)?))
    }

    pub fn parse(content: &str) -> Self {
        let mut words = HashSet::new();
        for line in content.lines() {
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            words.insert(word.to_lowercase());
        }
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool {
        if self.words.contains(token) {
            return true;
        }
        // Avoid allocating for the common all-lowercase case
        token.chars().any(char::is_uppercase) && self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

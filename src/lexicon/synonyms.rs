//! Synset-based lexical knowledge base
//!
//! A term's synonyms are the lemmas of every synset the term belongs to,
//! the term itself included. Lemmas may be multi-word (`lower_limit`);
//! filtering those out is the expander's job, not the lexicon's.

use ahash::{HashMap, HashMapExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{read_data_file, LexiconError};

const BUILTIN_SYNSETS: &str = include_str!("../../data/synonyms.toml");

/// Lexical knowledge base lookup
pub trait SynonymLexicon: Send + Sync {
    /// All synonym lemmas for a single term, in lexicon order
    ///
    /// Unknown terms yield an empty list.
    fn synonyms(&self, term: &str) -> Vec<String>;
}

/// One sense with the lemmas that express it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synset {
    pub name: String,
    pub lemmas: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SynsetFile {
    #[serde(default)]
    synset: Vec<Synset>,
}

/// In-memory synset lexicon indexed by lemma
#[derive(Debug, Clone, Default)]
pub struct SynsetLexicon {
    synsets: Vec<Synset>,
    /// lowercase lemma -> indices into `synsets`
    by_lemma: HashMap<String, Vec<usize>>,
}

impl SynsetLexicon {
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::parse(BUILTIN_SYNSETS, "built-in synonyms")
    }

    pub fn from_file(path: &Path) -> Result<Self, LexiconError> {
        let content = read_data_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, what: &str) -> Result<Self, LexiconError> {
        let file: SynsetFile = toml::from_str(content).map_err(|source| LexiconError::Parse {
            what: what.to_string(),
            source,
        })?;
        Ok(Self::from_synsets(file.synset))
    }

    pub fn from_synsets(synsets: Vec<Synset>) -> Self {
        let mut by_lemma: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, synset) in synsets.iter().enumerate() {
            for lemma in &synset.lemmas {
                let entry = by_lemma.entry(lemma.to_lowercase()).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
        }
        Self { synsets, by_lemma }
    }

    pub fn len(&self) -> usize {
        self.synsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.synsets.is_empty()
    }
}

impl SynonymLexicon for SynsetLexicon {
    fn synonyms(&self, term: &str) -> Vec<String> {
        let Some(indices) = self.by_lemma.get(&term.to_lowercase()) else {
            return Vec::new();
        };

        indices
            .iter()
            .flat_map(|&idx| self.synsets[idx].lemmas.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let lexicon = SynsetLexicon::builtin().unwrap();
        assert!(!lexicon.is_empty());

        let minimum = lexicon.synonyms("minimum");
        assert!(minimum.contains(&"lowest".to_string()));
        assert!(minimum.contains(&"lower_limit".to_string()));
    }

    #[test]
    fn test_unknown_term() {
        let lexicon = SynsetLexicon::builtin().unwrap();
        assert!(lexicon.synonyms("zyzzyva").is_empty());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lexicon = SynsetLexicon::from_synsets(vec![Synset {
            name: "wage.n.01".to_string(),
            lemmas: vec!["wage".to_string(), "Pay".to_string()],
        }]);
        assert_eq!(lexicon.synonyms("WAGE"), vec!["wage", "Pay"]);
        assert_eq!(lexicon.synonyms("pay"), vec!["wage", "Pay"]);
    }

    #[test]
    fn test_term_in_several_synsets() {
        let lexicon = SynsetLexicon::from_synsets(vec![
            Synset {
                name: "a".to_string(),
                lemmas: vec!["bill".to_string(), "invoice".to_string()],
            },
            Synset {
                name: "b".to_string(),
                lemmas: vec!["bill".to_string(), "legislation".to_string()],
            },
        ]);
        assert_eq!(
            lexicon.synonyms("bill"),
            vec!["bill", "invoice", "bill", "legislation"]
        );
    }

    #[test]
    fn test_malformed_file() {
        let result = SynsetLexicon::parse("[[synset]]\nname = 1", "test");
        assert!(matches!(result, Err(LexiconError::Parse { .. })));
    }
}

// Lemma table used by the query normalizer
use ahash::{HashMap, HashMapExt};
use serde::Deserialize;
use std::path::Path;

use super::{read_data_file, LexiconError};

const BUILTIN_LEMMAS: &str = include_str!("../../data/lemmas.toml");

#[derive(Debug, Deserialize)]
struct LemmaFile {
    #[serde(default)]
    lemmas: std::collections::HashMap<String, String>,
}

/// Surface form -> canonical lemma mapping
///
/// Chains (`a -> b`, `b -> c`) are collapsed at load time so that every
/// value is a fixed point of the table. That makes `lookup` idempotent.
#[derive(Debug, Clone, Default)]
pub struct LemmaTable {
    forms: HashMap<String, String>,
}

impl LemmaTable {
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::parse(BUILTIN_LEMMAS, "built-in lemmas")
    }

    pub fn from_file(path: &Path) -> Result<Self, LexiconError> {
        let content = read_data_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, what: &str) -> Result<Self, LexiconError> {
        let file: LemmaFile = toml::from_str(content).map_err(|source| LexiconError::Parse {
            what: what.to_string(),
            source,
        })?;
        Self::from_pairs(file.lemmas)
    }

    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, LexiconError> {
        let raw: HashMap<String, String> = pairs
            .into_iter()
            .map(|(form, lemma)| (form.to_lowercase(), lemma.to_lowercase()))
            .filter(|(form, lemma)| form != lemma)
            .collect();

        let mut forms = HashMap::with_capacity(raw.len());
        for form in raw.keys() {
            let mut lemma = &raw[form];
            let mut hops = 0;
            while let Some(next) = raw.get(lemma) {
                hops += 1;
                if hops > raw.len() {
                    return Err(LexiconError::LemmaCycle(form.clone()));
                }
                lemma = next;
            }
            forms.insert(form.clone(), lemma.clone());
        }

        Ok(Self { forms })
    }

    /// Canonical lemma for a term, matched case-insensitively
    pub fn lookup(&self, term: &str) -> Option<&str> {
        self.forms.get(&term.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

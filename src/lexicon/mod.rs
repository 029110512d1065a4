//! Lexical primitives consumed by the query analyzer
//!
//! Every primitive here is a pure function of its input once loaded:
//! - Stopword membership and tokenization
//! - Synonym lookup (synset-based lexical knowledge base)
//! - Lemma lookup used by the normalizer
//! - Named-entity recognition over original-case text
//!
//! Built-in data ships in `data/` and is compiled into the binary. Any file
//! named in `[lexicon]` replaces the corresponding built-in set.

mod entities;
mod lemmas;
mod stopwords;
mod synonyms;
mod tokenizer;

pub use entities::{
    Entity, EntityLabel, EntityPatternConfig, EntityPatternsConfig, EntityRecognizer,
    PatternEntityRecognizer,
};
pub use lemmas::LemmaTable;
pub use stopwords::StopwordSet;
pub use synonyms::{SynonymLexicon, Synset, SynsetLexicon};
pub use tokenizer::{strip_punctuation, tokenize};

use crate::config::LexiconConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: String,
        source: toml::de::Error,
    },

    #[error("Invalid entity pattern for {label}: {source}")]
    InvalidPattern { label: String, source: regex::Error },

    #[error("Entity pattern for {label} has no capture group {group}")]
    MissingGroup { label: String, group: usize },

    #[error("Lemma table cycle through '{0}'")]
    LemmaCycle(String),
}

/// Bundle of the lexical primitives shared (read-only) by every request
#[derive(Clone)]
pub struct Lexicon {
    pub stopwords: Arc<StopwordSet>,
    pub lemmas: Arc<LemmaTable>,
    pub synonyms: Arc<dyn SynonymLexicon>,
    pub entities: Arc<dyn EntityRecognizer>,
}

impl Lexicon {
    /// Load the built-in lexical data
    pub fn builtin() -> Result<Self, LexiconError> {
        Ok(Self {
            stopwords: Arc::new(StopwordSet::builtin()),
            lemmas: Arc::new(LemmaTable::builtin()?),
            synonyms: Arc::new(SynsetLexicon::builtin()?),
            entities: Arc::new(PatternEntityRecognizer::builtin()?),
        })
    }

    /// Load lexical data as configured, falling back to built-in sets
    pub fn from_config(config: &LexiconConfig) -> Result<Self, LexiconError> {
        let stopwords = match &config.stopwords_file {
            Some(path) => StopwordSet::from_file(path)?,
            None => StopwordSet::builtin(),
        };

        let lemmas = match &config.lemmas_file {
            Some(path) => LemmaTable::from_file(path)?,
            None => LemmaTable::builtin()?,
        };

        let synonyms = match &config.synonyms_file {
            Some(path) => SynsetLexicon::from_file(path)?,
            None => SynsetLexicon::builtin()?,
        };

        let entities = match &config.entities_file {
            Some(path) => PatternEntityRecognizer::from_file(path)?,
            None => PatternEntityRecognizer::builtin()?,
        };

        tracing::debug!(
            stopwords = stopwords.len(),
            lemmas = lemmas.len(),
            synsets = synonyms.len(),
            entity_patterns = entities.len(),
            "Lexicon loaded"
        );

        Ok(Self {
            stopwords: Arc::new(stopwords),
            lemmas: Arc::new(lemmas),
            synonyms: Arc::new(synonyms),
            entities: Arc::new(entities),
        })
    }
}

pub(crate) fn read_data_file(path: &Path) -> Result<String, LexiconError> {
    std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
        path: path.to_path_buf(),
        source,
    })
}

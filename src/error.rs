use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::lexicon::LexiconError;
use crate::retrieval::{IndexError, SearchError};

/// Main error type for the wapo-search application
#[derive(Error, Debug)]
pub enum SearchAppError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Lexical data (stopwords, synonyms, lemmas, entity patterns) failed to load
    #[error("Lexicon error: {0}")]
    Lexicon(#[from] LexiconError),

    /// Local index errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Embedding collaborator construction or batch encoding errors
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Query pipeline errors (validation, retrieval, embedding)
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for wapo-search operations
pub type Result<T> = std::result::Result<T, SearchAppError>;

//! Configuration management for wapo-search
//!
//! Configuration is a single TOML file. Every section has defaults so a
//! missing file still yields a working (local, offline) setup.

use crate::error::{Result, SearchAppError};
use crate::retrieval::{Analyzer, Ranker};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Prefix for environment overrides, e.g. `WAPO_SEARCH_BACKEND__URL`
pub const ENV_PREFIX: &str = "WAPO_SEARCH_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub backend: BackendConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Which search engine answers stage 1 and stage 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Remote Elasticsearch index
    Elasticsearch,
    /// Local tantivy index directory
    Local,
}

/// Search backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Base URL of the Elasticsearch node
    pub url: String,
    /// Elasticsearch index name
    pub index: String,
    /// Directory of the local tantivy index
    pub index_dir: PathBuf,
    /// Budget for a single retrieval call
    pub timeout_ms: u64,
}

/// How query embeddings are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    /// Remote embedding service (fasttext and sbert)
    Online,
    /// Local sentence-transformer via fastembed (sbert only)
    Offline,
}

/// Embedding collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub url: String,
    pub path: String,
    pub timeout_ms: u64,
    /// fastembed model used in offline mode
    pub local_model: String,
}

/// Long-query summarization method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMethod {
    /// Named entities plus importance gazetteer
    Entities,
    /// Tokens whose frequency clears a scaled mean
    Frequency,
}

/// Query pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Filtered queries with at most this many terms are expanded
    pub expand_max_terms: usize,
    /// Filtered queries with at least this many terms are summarized
    pub summarize_min_terms: usize,
    pub summarizer: SummaryMethod,
    pub frequency_scalar: f32,
    pub page_size: usize,
    pub default_limit: usize,
    pub default_analyzer: Analyzer,
    pub default_ranker: Ranker,
}

/// Lexical data overrides; unset entries use the built-in data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemmas_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities_file: Option<PathBuf>,
    /// Added to the importance gazetteer
    #[serde(default)]
    pub extra_keywords: Vec<String>,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_kind: Option<BackendKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_mode: Option<EmbeddingMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_analyzer: Option<Analyzer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ranker: Option<Ranker>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SearchAppError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SearchAppError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| SearchAppError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| SearchAppError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(kind) = overrides.backend_kind {
            self.backend.kind = kind;
        }
        if let Some(mode) = overrides.embedding_mode {
            self.embedding.mode = mode;
        }
        if let Some(analyzer) = overrides.default_analyzer {
            self.pipeline.default_analyzer = analyzer;
        }
        if let Some(ranker) = overrides.default_ranker {
            self.pipeline.default_ranker = ranker;
        }

        ConfigValidator::validate(self)
    }

    /// Apply environment variable overrides
    /// Environment variables in format: WAPO_SEARCH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "BACKEND__KIND" => {
                self.backend.kind = parse_enum(path, value)?;
            }
            "BACKEND__URL" => {
                self.backend.url = value.to_string();
            }
            "BACKEND__INDEX" => {
                self.backend.index = value.to_string();
            }
            "BACKEND__INDEX_DIR" => {
                self.backend.index_dir = PathBuf::from(value);
            }
            "EMBEDDING__MODE" => {
                self.embedding.mode = parse_enum(path, value)?;
            }
            "EMBEDDING__URL" => {
                self.embedding.url = value.to_string();
            }
            "PIPELINE__DEFAULT_ANALYZER" => {
                self.pipeline.default_analyzer =
                    value.parse().map_err(|e| SearchAppError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("{}", e),
                    })?;
            }
            "PIPELINE__DEFAULT_RANKER" => {
                self.pipeline.default_ranker =
                    value.parse().map_err(|e| SearchAppError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("{}", e),
                    })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SearchAppError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("wapo-search").join("config.toml"))
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| SearchAppError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| SearchAppError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Parse a snake_case enum value through its serde representation
fn parse_enum<T: serde::de::DeserializeOwned>(path: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase())).map_err(|e| {
        SearchAppError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}': {}", value, e),
        }
    })
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("~/.wapo-search");

        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            backend: BackendConfig {
                kind: BackendKind::Local,
                url: "http://localhost:9200".to_string(),
                index: "wapo_docs_50k".to_string(),
                index_dir: data_dir.join("index"),
                timeout_ms: 10_000,
            },
            embedding: EmbeddingConfig {
                mode: EmbeddingMode::Offline,
                url: "http://localhost:5050".to_string(),
                path: "/encode".to_string(),
                timeout_ms: 10_000,
                local_model: "all-MiniLM-L6-v2".to_string(),
            },
            pipeline: PipelineConfig {
                expand_max_terms: 3,
                summarize_min_terms: 8,
                summarizer: SummaryMethod::Entities,
                frequency_scalar: 1.2,
                page_size: 8,
                default_limit: 20,
                default_analyzer: Analyzer::Default,
                default_ranker: Ranker::Bm25,
            },
            lexicon: LexiconConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

use crate::config::{Config, EmbeddingMode};
use crate::error::{Result, SearchAppError, ValidationError};
use crate::retrieval::Ranker;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every problem at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_backend(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_pipeline(config, &mut errors);
        Self::validate_lexicon(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SearchAppError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_backend(config: &Config, errors: &mut Vec<ValidationError>) {
        if !Self::is_http_url(&config.backend.url) {
            errors.push(ValidationError::new(
                "backend.url",
                format!("Expected an http(s) URL, got '{}'", config.backend.url),
            ));
        }

        if config.backend.index.is_empty() {
            errors.push(ValidationError::new(
                "backend.index",
                "Index name cannot be empty",
            ));
        }

        if config.backend.index_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "backend.index_dir",
                "Index directory cannot be empty",
            ));
        }

        if config.backend.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "backend.timeout_ms",
                "Timeout must be greater than 0",
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.embedding.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "embedding.timeout_ms",
                "Timeout must be greater than 0",
            ));
        }

        match config.embedding.mode {
            EmbeddingMode::Online => {
                if !Self::is_http_url(&config.embedding.url) {
                    errors.push(ValidationError::new(
                        "embedding.url",
                        format!("Expected an http(s) URL, got '{}'", config.embedding.url),
                    ));
                }
                if !config.embedding.path.starts_with('/') {
                    errors.push(ValidationError::new(
                        "embedding.path",
                        "Path must start with '/'",
                    ));
                }
            }
            EmbeddingMode::Offline => {
                if config.embedding.local_model.is_empty() {
                    errors.push(ValidationError::new(
                        "embedding.local_model",
                        "Model name cannot be empty",
                    ));
                }
                // The local model only covers the sentence-transformer family
                if config.pipeline.default_ranker == Ranker::FastText {
                    errors.push(ValidationError::new(
                        "pipeline.default_ranker",
                        "fasttext embeddings require embedding.mode = \"online\"",
                    ));
                }
            }
        }
    }

    fn validate_pipeline(config: &Config, errors: &mut Vec<ValidationError>) {
        let pipeline = &config.pipeline;

        if pipeline.expand_max_terms >= pipeline.summarize_min_terms {
            errors.push(ValidationError::new(
                "pipeline.expand_max_terms",
                format!(
                    "Must be below summarize_min_terms ({} >= {})",
                    pipeline.expand_max_terms, pipeline.summarize_min_terms
                ),
            ));
        }

        if pipeline.page_size == 0 {
            errors.push(ValidationError::new(
                "pipeline.page_size",
                "Page size must be greater than 0",
            ));
        }

        if pipeline.default_limit == 0 {
            errors.push(ValidationError::new(
                "pipeline.default_limit",
                "Result limit must be greater than 0",
            ));
        }

        if !(pipeline.frequency_scalar > 0.0 && pipeline.frequency_scalar.is_finite()) {
            errors.push(ValidationError::new(
                "pipeline.frequency_scalar",
                format!(
                    "Scalar must be a positive number, got {}",
                    pipeline.frequency_scalar
                ),
            ));
        }
    }

    fn validate_lexicon(config: &Config, errors: &mut Vec<ValidationError>) {
        let files = [
            ("lexicon.stopwords_file", &config.lexicon.stopwords_file),
            ("lexicon.synonyms_file", &config.lexicon.synonyms_file),
            ("lexicon.lemmas_file", &config.lexicon.lemmas_file),
            ("lexicon.entities_file", &config.lexicon.entities_file),
        ];

        // Existence is checked when the lexicon loads; paths may contain ~
        for (key, path) in files {
            if let Some(path) = path {
                if path.as_os_str().is_empty() {
                    errors.push(ValidationError::new(key, "Path cannot be empty"));
                }
            }
        }

        for keyword in &config.lexicon.extra_keywords {
            if keyword.trim().is_empty() {
                errors.push(ValidationError::new(
                    "lexicon.extra_keywords",
                    "Keywords cannot be blank",
                ));
                break;
            }
        }
    }

    fn is_http_url(s: &str) -> bool {
        s.starts_with("http://") || s.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        let mut config = Config::default();
        config.pipeline.expand_max_terms = 8;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.pipeline.page_size = 0;
        config.pipeline.default_limit = 0;
        config.backend.url = "localhost:9200".to_string();

        match ConfigValidator::validate(&config) {
            Err(SearchAppError::ConfigValidation { errors }) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_offline_fasttext_rejected() {
        let mut config = Config::default();
        config.pipeline.default_ranker = Ranker::FastText;
        assert!(ConfigValidator::validate(&config).is_err());

        config.embedding.mode = EmbeddingMode::Online;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_lexicon_path() {
        let mut config = Config::default();
        config.lexicon.synonyms_file = Some(PathBuf::new());
        assert!(ConfigValidator::validate(&config).is_err());
    }
}

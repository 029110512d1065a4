//! Named-entity recognition over query text
//!
//! Configuration-driven: every entity category is a pre-compiled regex
//! loaded from `entities.toml`. Recognition is case-sensitive unless the
//! pattern opts out with an inline `(?i)` group.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::{read_data_file, LexiconError};

const BUILTIN_PATTERNS: &str = include_str!("../../data/entities.toml");

/// Entity categories, named after the OntoNotes label set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Norp,
    Fac,
    Org,
    Gpe,
    Loc,
    Product,
    Event,
    WorkOfArt,
    Law,
    Language,
    Date,
    Time,
    Percent,
    Money,
    Quantity,
    Ordinal,
    Cardinal,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Norp => "NORP",
            EntityLabel::Fac => "FAC",
            EntityLabel::Org => "ORG",
            EntityLabel::Gpe => "GPE",
            EntityLabel::Loc => "LOC",
            EntityLabel::Product => "PRODUCT",
            EntityLabel::Event => "EVENT",
            EntityLabel::WorkOfArt => "WORK_OF_ART",
            EntityLabel::Law => "LAW",
            EntityLabel::Language => "LANGUAGE",
            EntityLabel::Date => "DATE",
            EntityLabel::Time => "TIME",
            EntityLabel::Percent => "PERCENT",
            EntityLabel::Money => "MONEY",
            EntityLabel::Quantity => "QUANTITY",
            EntityLabel::Ordinal => "ORDINAL",
            EntityLabel::Cardinal => "CARDINAL",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized entity span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    /// Byte offset of the span start
    pub start: usize,
    /// Byte offset one past the span end
    pub end: usize,
}

/// Entity recognizer contract
pub trait EntityRecognizer: Send + Sync {
    /// Entities in emission order (ascending start offset)
    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// Entity pattern configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPatternConfig {
    pub label: EntityLabel,
    pub pattern: String,
    /// Capture group used as the entity span (0 = whole match)
    #[serde(default)]
    pub group: usize,
    #[serde(default)]
    pub description: String,
}

/// Entity patterns configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPatternsConfig {
    pub entity: Vec<EntityPatternConfig>,
}

#[derive(Debug, Clone)]
struct CompiledEntityPattern {
    label: EntityLabel,
    regex: Regex,
    group: usize,
}

/// Regex-backed entity recognizer
#[derive(Debug, Clone)]
pub struct PatternEntityRecognizer {
    patterns: Vec<CompiledEntityPattern>,
}

impl PatternEntityRecognizer {
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::parse(BUILTIN_PATTERNS, "built-in entity patterns")
    }

    pub fn from_file(path: &Path) -> Result<Self, LexiconError> {
        let content = read_data_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, what: &str) -> Result<Self, LexiconError> {
        let config: EntityPatternsConfig =
            toml::from_str(content).map_err(|source| LexiconError::Parse {
                what: what.to_string(),
                source,
            })?;
        Self::from_config(config)
    }

    /// Compile every pattern up front
    pub fn from_config(config: EntityPatternsConfig) -> Result<Self, LexiconError> {
        let mut patterns = Vec::with_capacity(config.entity.len());
        for entry in config.entity {
            let regex =
                Regex::new(&entry.pattern).map_err(|source| LexiconError::InvalidPattern {
                    label: entry.label.to_string(),
                    source,
                })?;

            // captures_len counts the implicit whole-match group
            if entry.group >= regex.captures_len() {
                return Err(LexiconError::MissingGroup {
                    label: entry.label.to_string(),
                    group: entry.group,
                });
            }

            patterns.push(CompiledEntityPattern {
                label: entry.label,
                regex,
                group: entry.group,
            });
        }
        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl EntityRecognizer for PatternEntityRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        // (start, end, pattern order, label)
        let mut spans: Vec<(usize, usize, usize, EntityLabel)> = Vec::new();
        for (order, pattern) in self.patterns.iter().enumerate() {
            for caps in pattern.regex.captures_iter(text) {
                if let Some(m) = caps.get(pattern.group) {
                    if m.start() < m.end() {
                        spans.push((m.start(), m.end(), order, pattern.label));
                    }
                }
            }
        }

        // Earliest start wins, then the longest span, then declaration order
        spans.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let mut entities = Vec::new();
        let mut covered_until = 0;
        for (start, end, _, label) in spans {
            if start < covered_until {
                continue;
            }
            covered_until = end;
            entities.push(Entity {
                text: text[start..end].to_string(),
                label,
                start,
                end,
            });
        }

        entities
    }
}

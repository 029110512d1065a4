//! Query strategy selection
//!
//! Short queries are expanded with synonyms, long queries are summarized
//! to their salient terms, and everything in between is used as filtered.

use crate::query::FilteredQuery;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which transformation produced a processed query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Expanded,
    Summarized,
    Passthrough,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Expanded => "expanded",
            StrategyKind::Summarized => "summarized",
            StrategyKind::Passthrough => "passthrough",
        };
        f.write_str(name)
    }
}

/// Selected transformation, carrying exactly the inputs it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    /// Lowercase terms to expand with synonyms
    Expand { terms: Vec<String> },
    /// Lowercase terms plus the original-case text for entity recognition
    Summarize { terms: Vec<String>, original: String },
    /// Lowercase terms used verbatim
    Passthrough { terms: Vec<String> },
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Expand { .. } => StrategyKind::Expanded,
            Strategy::Summarize { .. } => StrategyKind::Summarized,
            Strategy::Passthrough { .. } => StrategyKind::Passthrough,
        }
    }
}

/// Chooses a strategy from the filtered term count
#[derive(Debug, Clone, Copy)]
pub struct StrategySelector {
    expand_max_terms: usize,
    summarize_min_terms: usize,
}

impl StrategySelector {
    /// Thresholds are inclusive; `expand_max_terms < summarize_min_terms`
    /// is enforced by the config validator.
    pub fn new(expand_max_terms: usize, summarize_min_terms: usize) -> Self {
        Self {
            expand_max_terms,
            summarize_min_terms,
        }
    }

    pub fn select(&self, filtered: &FilteredQuery) -> Strategy {
        let count = filtered.len();
        if count <= self.expand_max_terms {
            Strategy::Expand {
                terms: filtered.lower.clone(),
            }
        } else if count >= self.summarize_min_terms {
            Strategy::Summarize {
                terms: filtered.lower.clone(),
                original: filtered.original.clone(),
            }
        } else {
            Strategy::Passthrough {
                terms: filtered.lower.clone(),
            }
        }
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(3, 8)
    }
}

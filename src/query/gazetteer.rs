//! Static importance gazetteer for the news collection's core topic

use ahash::{HashSet, HashSetExt};

/// Topic keywords that always survive summarization
pub const TOPIC_KEYWORDS: &[&str] = &[
    "federal",
    "minimum",
    "wage",
    "increase",
    "president",
    "congress",
    "united states",
    "us",
    "action",
    "advocacy",
    "government",
    "worker",
    "contract",
    "authority",
    "bureau",
    "labor",
    "governor",
    "acts",
    "law",
    "bill",
    "workforce",
    "supreme court",
    "states",
    "state",
];

/// US states and territories with their postal abbreviations
pub const US_STATES: &[&str] = &[
    "Alabama", "AL", "Alaska", "AK", "American Samoa", "AS", "Arizona", "AZ",
    "Arkansas", "AR", "California", "CA", "Colorado", "CO", "Connecticut", "CT",
    "Delaware", "DE", "District of Columbia", "DC", "Florida", "FL", "Georgia", "GA",
    "Guam", "GU", "Hawaii", "HI", "Idaho", "ID", "Illinois", "IL", "Indiana", "IN",
    "Iowa", "IA", "Kansas", "KS", "Kentucky", "KY", "Louisiana", "LA", "Maine", "ME",
    "Maryland", "MD", "Massachusetts", "MA", "Michigan", "MI", "Minnesota", "MN",
    "Mississippi", "MS", "Missouri", "MO", "Montana", "MT", "Nebraska", "NE",
    "Nevada", "NV", "New Hampshire", "NH", "New Jersey", "NJ", "New Mexico", "NM",
    "New York", "NY", "North Carolina", "NC", "North Dakota", "ND",
    "Northern Mariana Islands", "MP", "Ohio", "OH", "Oklahoma", "OK", "Oregon", "OR",
    "Pennsylvania", "PA", "Puerto Rico", "PR", "Rhode Island", "RI",
    "South Carolina", "SC", "South Dakota", "SD", "Tennessee", "TN", "Texas", "TX",
    "Utah", "UT", "Vermont", "VT", "Virgin Islands", "VI", "Virginia", "VA",
    "Washington", "WA", "West Virginia", "WV", "Wisconsin", "WI", "Wyoming", "WY",
];

/// Lowercased set of domain-significant terms
#[derive(Debug, Clone)]
pub struct Gazetteer {
    terms: HashSet<String>,
}

impl Gazetteer {
    /// Topic keywords plus every state and territory
    pub fn builtin() -> Self {
        Self::with_extra_keywords(&[] as &[String])
    }

    pub fn with_extra_keywords<S: AsRef<str>>(extra: &[S]) -> Self {
        let mut terms = HashSet::new();
        let builtin = TOPIC_KEYWORDS.iter().chain(US_STATES.iter()).copied();
        for term in builtin.chain(extra.iter().map(AsRef::as_ref)) {
            let term = term.trim();
            if !term.is_empty() {
                terms.insert(term.to_lowercase());
            }
        }
        Self { terms }
    }

    /// Whether a lowercase token is important
    pub fn contains(&self, token: &str) -> bool {
        self.terms.contains(token)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_states() {
        let gazetteer = Gazetteer::builtin();
        assert!(gazetteer.contains("wage"));
        assert!(gazetteer.contains("texas"));
        assert!(gazetteer.contains("tx"));
        assert!(gazetteer.contains("new york"));
        assert!(!gazetteer.contains("Texas"));
        assert!(!gazetteer.contains("salary"));
    }

    #[test]
    fn test_extra_keywords() {
        let gazetteer = Gazetteer::with_extra_keywords(&["Overtime", "  "]);
        assert!(gazetteer.contains("overtime"));
        assert_eq!(gazetteer.len(), Gazetteer::builtin().len() + 1);
    }
}

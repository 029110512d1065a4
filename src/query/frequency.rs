//! Frequency-based summarization for long queries
//!
//! An alternative to entity/gazetteer summarization: keep the terms the
//! user repeated noticeably more than average.

use ahash::{HashMap, HashMapExt};

/// Default multiplier applied to the mean term frequency
pub const DEFAULT_FREQUENCY_SCALAR: f32 = 1.2;

/// Terms whose count reaches `mean_count * scalar`, in first-seen order
pub fn frequent_terms(terms: &[String], scalar: f32) -> Vec<String> {
    if terms.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for term in terms {
        let count = counts.entry(term.as_str()).or_insert(0);
        if *count == 0 {
            order.push(term.as_str());
        }
        *count += 1;
    }

    let threshold = (terms.len() as f32 / order.len() as f32) * scalar;

    order
        .into_iter()
        .filter(|term| counts[term] as f32 >= threshold)
        .map(str::to_string)
        .collect()
}

/// Space-joined [`frequent_terms`]
pub fn summarize_by_frequency(terms: &[String], scalar: f32) -> String {
    frequent_terms(terms, scalar).join(" ")
}

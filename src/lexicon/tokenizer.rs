// Punctuation stripping and word tokenization
use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

fn punctuation() -> &'static Regex {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    PUNCTUATION.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"))
}

/// Remove every character that is neither a word character nor whitespace
pub fn strip_punctuation(text: &str) -> String {
    punctuation().replace_all(text, "").into_owned()
}

/// Split text into words on Unicode word boundaries
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_string).collect()
}

//! Text normalization and word-boundary phrase matching.
//!
//! All lexical evidence in the pipeline (trigger detection, name matches,
//! token overlap) goes through [`Tokens`], so "java" never matches inside
//! "javascript" and "0-2" matches "0 - 2 years" the same way everywhere.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Words ignored when counting query/name token overlap.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "for", "and", "or", "to", "in", "of", "is", "are", "with", "on", "at", "by",
];

#[allow(clippy::expect_used)]
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+[+#]*").expect("token pattern is valid"));

#[allow(clippy::expect_used)]
static JAVA_SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bjava\s+script\b").expect("java script pattern is valid"));

/// Lowercase, collapse whitespace and fold spelling variants.
pub fn normalize_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let lowered = collapsed.to_lowercase();
    JAVA_SCRIPT_RE.replace_all(&lowered, "javascript").into_owned()
}

/// Word tokens of already-lowercased text.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether `word` is a stopword.
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// A tokenized text supporting whole-word phrase lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<String>,
}

impl Tokens {
    /// Tokenize `text`.
    pub fn new(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
        }
    }

    /// Whether `phrase` occurs as a contiguous run of whole tokens.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let needle = tokenize(phrase);
        if needle.is_empty() || needle.len() > self.tokens.len() {
            return false;
        }
        self.tokens
            .windows(needle.len())
            .any(|window| window == needle.as_slice())
    }

    /// Whether any of `phrases` occurs.
    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.contains_phrase(p))
    }

    /// Distinct non-stopword tokens.
    pub fn content_words(&self) -> BTreeSet<&str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|t| !is_stopword(t))
            .collect()
    }

    /// Distinct tokens longer than `min_len` characters.
    pub fn keywords(&self, min_len: usize) -> BTreeSet<&str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|t| t.chars().count() > min_len)
            .collect()
    }

    /// All tokens in order.
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

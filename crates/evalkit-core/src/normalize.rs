//! Text normalization for golden scoring.
//!
//! Canonicalizes free text into a comparable token sequence:
//! lowercase, accents stripped, punctuation removed, whitespace collapsed.
//! Two strings that differ only in those respects normalize identically.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical form of a raw string plus its word tokens.
///
/// Serializes as the canonical string. Deserializing normalizes the input
/// again, so `text` and `tokens` always agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalizedText {
    text: String,
    tokens: Vec<String>,
}

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        let text = normalize(raw);
        let tokens = split_tokens(&text);
        Self { text, tokens }
    }

    /// The canonical string (tokens joined by single spaces).
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<&str> for NormalizedText {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for NormalizedText {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<NormalizedText> for String {
    fn from(normalized: NormalizedText) -> Self {
        normalized.text
    }
}

/// Normalize text for token comparison.
///
/// The result contains only lowercased alphanumeric or `_` characters,
/// grouped into tokens separated by exactly one space, with no leading
/// or trailing whitespace. Empty and whitespace-only input yields `""`.
///
/// Uppercase letters with no lowercase mapping (`ℂ`, `ϒ`) are kept as is.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    // NFD splits "é" into "e" + U+0301; dropping the mark leaves the base letter.
    let stripped = lowered
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if is_word_char(c) { c } else { ' ' });

    let mut result = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for c in stripped {
        if c == ' ' {
            pending_space = !result.is_empty();
            continue;
        }
        if pending_space {
            result.push(' ');
            pending_space = false;
        }
        result.push(c);
    }

    result
}

/// Split text into normalized word tokens, preserving input order.
pub fn tokens(text: &str) -> Vec<String> {
    split_tokens(&normalize(text))
}

fn split_tokens(normalized: &str) -> Vec<String> {
    normalized
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Word characters: Unicode alphanumerics and underscore.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

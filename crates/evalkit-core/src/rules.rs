//! Rule predicates over model output.
//!
//! These checks use a lighter normalization than golden scoring: case and
//! whitespace are folded and surrounding punctuation is trimmed, but accents
//! and interior punctuation are kept.
//!
//! Refusal detection deliberately skips even that light normalization
//! (see [`contains_any_raw`]) so that a literal refusal phrase is never
//! masked by stripping.

use lazy_static::lazy_static;
use regex::Regex;

/// Phrases that indicate the model declined to answer (Polish and English).
pub const REFUSAL_HINTS: &[&str] = &[
    "nie mogę",
    "nie moge",
    "nie jestem w stanie",
    "nie posiadam",
    "nie mam dostępu",
    "as an ai",
    "i can't",
    "i cannot",
    "sorry",
    "nie wiem",
];

/// Characters trimmed from both ends by [`normalize_for_rules`].
pub const RULE_STRIP_CHARS: &[char] = &[
    ' ', '\t', '\r', '\n', '.', ',', ';', ':', '!', '?', '"', '\'', '`', '(', ')', '[', ']', '{',
    '}',
];

lazy_static! {
    static ref ONLY_DIGITS: Regex = Regex::new(r"^\d+$").unwrap();
}

/// Light normalization for rule matching.
///
/// Lowercases, folds every whitespace run (including non-breaking spaces)
/// into a single space, and trims [`RULE_STRIP_CHARS`] from both ends.
pub fn normalize_for_rules(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_matches(RULE_STRIP_CHARS).to_string()
}

/// True if any needle occurs as a substring of the haystack, after both
/// are normalized with [`normalize_for_rules`].
///
/// Matches inside larger words: `"cat"` is found in `"category"`.
pub fn contains_any<I, S>(haystack: &str, needles: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let h = normalize_for_rules(haystack);
    needles
        .into_iter()
        .any(|n| h.contains(normalize_for_rules(n.as_ref()).as_str()))
}

/// True if any word occurs as a whole word in the haystack, after both are
/// normalized with [`normalize_for_rules`].
///
/// Word boundaries are Unicode-aware: `"cat"` is not found in `"category"`.
pub fn contains_word<I, S>(haystack: &str, words: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let h = normalize_for_rules(haystack);
    words.into_iter().any(|w| {
        let pattern = format!(r"\b{}\b", regex::escape(&normalize_for_rules(w.as_ref())));
        match Regex::new(&pattern) {
            Ok(re) => re.is_match(&h),
            Err(e) => {
                tracing::warn!(word = w.as_ref(), error = %e, "word pattern rejected");
                false
            }
        }
    })
}

/// Case-insensitive substring test with no other normalization.
pub fn contains_any_raw<I, S>(haystack: &str, needles: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    first_raw_match(haystack, needles).is_some()
}

/// True if the text contains any of [`REFUSAL_HINTS`].
pub fn looks_like_refusal(text: &str) -> bool {
    contains_any_raw(text, REFUSAL_HINTS)
}

/// True iff the trimmed text is one or more decimal digits and nothing else.
pub fn only_number(text: &str) -> bool {
    ONLY_DIGITS.is_match(text.trim())
}

fn first_raw_match<I, S>(haystack: &str, needles: I) -> Option<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let h = haystack.to_lowercase();
    needles
        .into_iter()
        .find(|n| h.contains(n.as_ref().to_lowercase().as_str()))
}

/// Refusal detection with a configurable phrase list.
///
/// `RefusalDetector::default()` uses [`REFUSAL_HINTS`]; supply your own list
/// to localize or narrow detection.
#[derive(Debug, Clone)]
pub struct RefusalDetector {
    phrases: Vec<String>,
}

impl RefusalDetector {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn looks_like_refusal(&self, text: &str) -> bool {
        self.matched_phrase(text).is_some()
    }

    /// The first configured phrase found in `text`, if any.
    pub fn matched_phrase(&self, text: &str) -> Option<&str> {
        first_raw_match(text, self.phrases.iter()).map(String::as_str)
    }
}

impl Default for RefusalDetector {
    fn default() -> Self {
        Self::new(REFUSAL_HINTS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_for_rules() {
        assert_eq!(normalize_for_rules("  Hello,\u{00A0}\u{00A0}World!  "), "hello, world");
        assert_eq!(normalize_for_rules("(\"Quoted\")"), "quoted");
        assert_eq!(normalize_for_rules("Zażółć  gęślą"), "zażółć gęślą");
        assert_eq!(normalize_for_rules("...?!"), "");
        assert_eq!(normalize_for_rules("a.b"), "a.b");
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("I CANNOT help", ["cannot"]));
        assert!(contains_any("category theory", ["cat"]));
        assert!(contains_any("Stolica   to Warszawa.", ["to  warszawa"]));
        assert!(contains_any("Odpowiedź: Kraków!", ["KRAKÓW"]));
        assert!(!contains_any("Odpowiedź: Krakow", ["kraków"]));
        assert!(!contains_any("nothing here", ["missing", "absent"]));
        assert!(!contains_any("anything", Vec::<String>::new()));
    }

    #[test]
    fn test_contains_word() {
        assert!(!contains_word("category theory", ["cat"]));
        assert!(contains_word("the cat sat", ["cat"]));
        assert!(contains_word("The CAT sat.", ["Cat!"]));
        assert!(contains_word("żółw idzie", ["żółw"]));
        assert!(!contains_word("żółwik idzie", ["żółw"]));
        assert!(contains_word("cost is 3.5 (approx)", ["3.5"]));
        assert!(!contains_word("cost is 305", ["3.5"]));
    }

    #[test]
    fn test_contains_any_raw() {
        assert!(contains_any_raw("Sorry, I CAN'T do that", ["i can't"]));
        assert!(!contains_any_raw("i  cannot", ["i cannot"]));
        assert!(!contains_any_raw("hello", ["world"]));
    }

    #[test]
    fn test_looks_like_refusal() {
        assert!(looks_like_refusal("Sorry, I can't do that"));
        assert!(looks_like_refusal("Niestety, NIE MOGĘ odpowiedzieć."));
        assert!(looks_like_refusal("As an AI language model..."));
        assert!(!looks_like_refusal("The answer is 42"));
    }

    #[test]
    fn test_only_number() {
        assert!(only_number("123"));
        assert!(only_number("  7 \n"));
        assert!(!only_number("12.3"));
        assert!(!only_number(""));
        assert!(!only_number("   "));
        assert!(!only_number("-5"));
        assert!(!only_number("12 34"));
        assert!(!only_number("42\nabc"));
    }

    #[test]
    fn test_refusal_detector_default() {
        let detector = RefusalDetector::default();
        assert_eq!(detector.phrases().len(), REFUSAL_HINTS.len());
        assert_eq!(detector.matched_phrase("Nie wiem, przepraszam"), Some("nie wiem"));
        assert!(detector.matched_phrase("Paryż").is_none());
    }

    #[test]
    fn test_refusal_detector_custom_phrases() {
        let detector = RefusalDetector::new(["je ne peux pas"]);
        assert!(detector.looks_like_refusal("Je ne peux pas répondre"));
        assert!(!detector.looks_like_refusal("Sorry, no"));
    }
}

//! Token-F1 scoring of model output against a golden answer.
//!
//! Precision and recall are computed over the multiset intersection of
//! normalized tokens. Each expected token can be matched at most once, so
//! repeating a word in the output cannot inflate the score.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::tokens;

/// Default minimum F1 for a golden case to pass.
pub const DEFAULT_F1_THRESHOLD: f64 = 0.40;

/// F1, precision and recall of one comparison, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

impl ScoreResult {
    /// Score reported when either side has no tokens.
    pub const ZERO: ScoreResult = ScoreResult {
        f1: 0.0,
        precision: 0.0,
        recall: 0.0,
    };

    /// `(f1, precision, recall)`
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.f1, self.precision, self.recall)
    }

    /// Whether the F1 score reaches `threshold`.
    pub fn meets(&self, threshold: f64) -> bool {
        self.f1 >= threshold
    }
}

impl Default for ScoreResult {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Compute token-level F1 between `actual` and `expected`.
///
/// Returns [`ScoreResult::ZERO`] when either input has no tokens: nothing
/// said or nothing expected is a mismatch, never a vacuous success.
pub fn token_f1(actual: &str, expected: &str) -> ScoreResult {
    let actual_tokens = tokens(actual);
    let expected_tokens = tokens(expected);

    if actual_tokens.is_empty() || expected_tokens.is_empty() {
        return ScoreResult::ZERO;
    }

    let intersection = consume_matches(&actual_tokens, &expected_tokens);

    let precision = intersection as f64 / actual_tokens.len() as f64;
    let recall = intersection as f64 / expected_tokens.len() as f64;
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    tracing::debug!(
        intersection,
        actual_len = actual_tokens.len(),
        expected_len = expected_tokens.len(),
        f1,
        "token f1 computed"
    );

    ScoreResult {
        f1,
        precision,
        recall,
    }
}

/// Walk `actual` in order, consuming one remaining occurrence in `expected`
/// per match. Returns the number of matched tokens.
fn consume_matches(actual: &[String], expected: &[String]) -> usize {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for token in expected {
        *remaining.entry(token.as_str()).or_insert(0) += 1;
    }

    let mut matched = 0;
    for token in actual {
        if let Some(count) = remaining.get_mut(token.as_str()) {
            if *count > 0 {
                *count -= 1;
                matched += 1;
            }
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(token_f1("", "anything"), ScoreResult::ZERO);
        assert_eq!(token_f1("anything", ""), ScoreResult::ZERO);
        assert_eq!(token_f1("...", "!!!"), ScoreResult::ZERO);
        assert_eq!(token_f1("   ", "   "), ScoreResult::ZERO);
    }

    #[test]
    fn test_exact_match_is_one() {
        let score = token_f1("The quick brown fox", "the QUICK brown fox!");
        assert_eq!(score.as_tuple(), (1.0, 1.0, 1.0));
    }

    #[test]
    fn test_no_overlap_is_zero() {
        let score = token_f1("alpha beta", "gamma delta");
        assert_eq!(score, ScoreResult::ZERO);
    }

    #[test]
    fn test_repeated_tokens_match_once() {
        let score = token_f1("cat cat cat", "cat dog");
        // one "cat" in expected, so intersection is 1
        assert!(approx(score.precision, 1.0 / 3.0));
        assert!(approx(score.recall, 0.5));
        assert!(approx(score.f1, 0.4));
    }

    #[test]
    fn test_duplicates_credited_up_to_expected_count() {
        let score = token_f1("to be or not to be", "to be to be");
        assert!(approx(score.recall, 1.0));
        assert!(approx(score.precision, 4.0 / 6.0));
    }

    #[test]
    fn test_polish_capital_scenario() {
        // "stolicą" loses its ogonek, so it matches "stolica":
        // shared tokens are warszawa, stolica, polski.
        let score = token_f1("Warszawa jest stolicą Polski", "Warszawa to stolica Polski");
        assert!(approx(score.precision, 0.75));
        assert!(approx(score.recall, 0.75));
        assert!(approx(score.f1, 0.75));
    }

    #[test]
    fn test_half_overlap() {
        let score = token_f1("Warszawa jest miastem Polski", "Warszawa to stolica Polski");
        assert!(approx(score.precision, 0.5));
        assert!(approx(score.recall, 0.5));
        assert!(approx(score.f1, 0.5));
    }

    #[test]
    fn test_meets_threshold() {
        let score = token_f1("paris is capital", "paris");
        assert!(score.meets(DEFAULT_F1_THRESHOLD));
        assert!(!token_f1("berlin", "paris").meets(DEFAULT_F1_THRESHOLD));
    }

    proptest! {
        #[test]
        fn prop_self_match_is_perfect(s in "[a-z]{1,8}( [a-z]{1,8}){0,10}") {
            let score = token_f1(&s, &s);
            prop_assert_eq!(score.as_tuple(), (1.0, 1.0, 1.0));
        }

        #[test]
        fn prop_swap_exchanges_precision_and_recall(
            a in "[a-e]{1,3}( [a-e]{1,3}){0,8}",
            e in "[a-e]{1,3}( [a-e]{1,3}){0,8}",
        ) {
            let forward = token_f1(&a, &e);
            let backward = token_f1(&e, &a);
            prop_assert_eq!(forward.precision, backward.recall);
            prop_assert_eq!(forward.recall, backward.precision);
            prop_assert_eq!(forward.f1, backward.f1);
        }

        #[test]
        fn prop_scores_are_bounded(a in "\\PC{0,40}", e in "\\PC{0,40}") {
            let score = token_f1(&a, &e);
            for v in [score.f1, score.precision, score.recall] {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}

//! # evalkit-core
//!
//! Deterministic scoring for language-model evaluation suites.
//!
//! This crate decides whether a model's output passes a test case:
//! - **Golden** cases compare the output to a reference answer with token F1
//! - **Rule** cases check for required and forbidden phrases or words, and
//!   reject refusals
//! - **Judge** cases compare a relevancy score from a second model against a
//!   threshold (the judge itself lives outside this crate)
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same output and row always produce the same verdict
//! 2. **No LLM calls**: Model and judge invocation belong to the caller
//! 3. **Total**: Scoring and rule functions never fail; odd input degrades to
//!    empty tokens, zero scores, or `false`
//! 4. **Parallel-safe**: All scoring functions are pure
//!
//! ## Example
//!
//! ```rust
//! use evalkit_core::{contains_word, looks_like_refusal, token_f1};
//!
//! let score = token_f1("Warszawa jest stolicą Polski", "Warszawa to stolica Polski");
//! assert!(score.f1 > 0.5);
//!
//! assert!(!contains_word("category theory", ["cat"]));
//! assert!(looks_like_refusal("Sorry, I can't do that"));
//! ```

pub mod case;
pub mod dataset;
pub mod golden;
pub mod normalize;
pub mod record;
pub mod rules;

// Re-export main types at crate root
pub use case::{
    evaluate_golden, evaluate_judge, evaluate_rules, evaluate_rules_with, judge_input,
    GoldenOutcome, JudgeOutcome, JudgeVerdict, RulesOutcome, TestCase,
};
pub use dataset::{
    Dataset, DatasetError, DatasetKind, GoldenRow, JudgeRow, Row, RowId, RuleRow,
    DEFAULT_JUDGE_THRESHOLD,
};
pub use golden::{token_f1, ScoreResult, DEFAULT_F1_THRESHOLD};
pub use normalize::{normalize, tokens, NormalizedText};
pub use record::{CaseDetails, CaseRecord, CaseStatus, SuiteReport, SuiteSummary};
pub use rules::{
    contains_any, contains_any_raw, contains_word, looks_like_refusal, normalize_for_rules,
    only_number, RefusalDetector, REFUSAL_HINTS, RULE_STRIP_CHARS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_case_end_to_end() {
        let text = r#"{"id": "pl", "input": "Jaka jest stolica Polski?", "expected": "Stolicą Polski jest Warszawa."}"#;
        let dataset = Dataset::from_jsonl(text, DatasetKind::Golden, "geo", "golden.jsonl").unwrap();
        let case = &dataset.cases()[0];

        let output = "Warszawa jest stolicą Polski.";
        let row = match &case.row {
            Row::Golden(row) => row,
            other => panic!("Expected golden row, got {:?}", other),
        };
        let outcome = evaluate_golden(row, output);
        assert!(outcome.passed());
        assert_eq!(outcome.score.as_tuple(), (1.0, 1.0, 1.0));

        let record = CaseRecord::golden(case, output, &outcome);
        assert_eq!(record.case_id, "geo::golden::pl");
        assert!(record.passed());
    }

    #[test]
    fn test_rules_case_end_to_end() {
        let text = r#"{"id": 1, "input": "Ile to 2+2? Podaj tylko liczbę.", "must_contain_any": ["4"], "must_not_contain_word": ["pięć"]}"#;
        let dataset = Dataset::from_jsonl(text, DatasetKind::Rules, "math", "rules.jsonl").unwrap();
        let case = &dataset.cases()[0];
        let row = match &case.row {
            Row::Rules(row) => row,
            other => panic!("Expected rules row, got {:?}", other),
        };

        assert!(evaluate_rules(row, "4").passed());
        assert!(only_number("4"));
        assert!(!evaluate_rules(row, "Nie wiem").passed());
        assert!(!evaluate_rules(row, "pięć, nie 4").passed());
    }
}

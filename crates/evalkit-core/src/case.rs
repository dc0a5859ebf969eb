//! Test cases and their pass/fail evaluation.
//!
//! A [`TestCase`] is one dataset row tagged with its test set and source
//! file. Given the model's output for that row, the `evaluate_*` functions
//! decide pass or fail and explain every failure.

use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetKind, GoldenRow, JudgeRow, Row, RuleRow};
use crate::golden::{token_f1, ScoreResult};
use crate::rules::{contains_any, contains_word, RefusalDetector};

pub const EMPTY_OUTPUT: &str = "Model returned empty output";
pub const REFUSAL_OUTPUT: &str = "Model output looks like a refusal";

/// One dataset row ready to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    pub test_set: String,

    /// Dataset file name
    pub dataset: String,

    pub row: Row,
}

impl TestCase {
    pub fn kind(&self) -> DatasetKind {
        self.row.kind()
    }

    /// `"{test_set}::{kind}::{row id}"`
    pub fn case_id(&self) -> String {
        format!("{}::{}::{}", self.test_set, self.kind(), self.row.case_key())
    }

    pub fn prompt(&self) -> &str {
        self.row.input()
    }
}

/// Result of a golden case.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldenOutcome {
    pub score: ScoreResult,
    pub threshold: f64,
    pub failures: Vec<String>,
}

/// Result of a rule case.
#[derive(Debug, Clone, PartialEq)]
pub struct RulesOutcome {
    /// Refusal phrase found in the output, if any
    pub refusal: Option<String>,
    pub failures: Vec<String>,
}

/// A relevancy judge's verdict on one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// Relevancy score in `[0, 1]`
    pub score: f64,

    /// The judge's explanation
    #[serde(default)]
    pub reason: Option<String>,
}

/// Result of a judge case.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOutcome {
    pub verdict: JudgeVerdict,
    pub threshold: f64,
    pub failures: Vec<String>,
}

macro_rules! impl_outcome {
    ($($ty:ty),*) => {$(
        impl $ty {
            pub fn passed(&self) -> bool {
                self.failures.is_empty()
            }

            pub fn failures(&self) -> &[String] {
                &self.failures
            }
        }
    )*};
}

impl_outcome!(GoldenOutcome, RulesOutcome, JudgeOutcome);

fn is_blank(output: &str) -> bool {
    output.trim().is_empty()
}

/// Score `output` against the row's expected answer.
pub fn evaluate_golden(row: &GoldenRow, output: &str) -> GoldenOutcome {
    let threshold = row.threshold();
    let score = token_f1(output, &row.expected);

    let mut failures = Vec::new();
    if is_blank(output) {
        failures.push(EMPTY_OUTPUT.to_string());
    } else if !score.meets(threshold) {
        failures.push(format!(
            "Golden mismatch: f1={:.3} < threshold={:.3}",
            score.f1, threshold
        ));
    }

    GoldenOutcome {
        score,
        threshold,
        failures,
    }
}

/// Check `output` against the row's rules using the default refusal hints.
pub fn evaluate_rules(row: &RuleRow, output: &str) -> RulesOutcome {
    evaluate_rules_with(row, output, &RefusalDetector::default())
}

/// Check `output` against the row's rules.
///
/// Every check runs; all failures are reported, in this order: empty
/// output, refusal, `must_contain_any`, `must_not_contain_any`,
/// `must_contain_word`, `must_not_contain_word`. Empty lists are skipped.
pub fn evaluate_rules_with(row: &RuleRow, output: &str, refusals: &RefusalDetector) -> RulesOutcome {
    let mut failures = Vec::new();

    if is_blank(output) {
        failures.push(EMPTY_OUTPUT.to_string());
    }

    let refusal = refusals.matched_phrase(output).map(str::to_string);
    if refusal.is_some() {
        failures.push(REFUSAL_OUTPUT.to_string());
    }

    if !row.must_contain_any.is_empty() && !contains_any(output, &row.must_contain_any) {
        failures.push(format!(
            "Expected output to contain any of: {:?}",
            row.must_contain_any
        ));
    }

    if !row.must_not_contain_any.is_empty() && contains_any(output, &row.must_not_contain_any) {
        failures.push(format!(
            "Output contains forbidden phrase from: {:?}",
            row.must_not_contain_any
        ));
    }

    if !row.must_contain_word.is_empty() && !contains_word(output, &row.must_contain_word) {
        failures.push(format!(
            "Expected output to contain any whole word of: {:?}",
            row.must_contain_word
        ));
    }

    if !row.must_not_contain_word.is_empty() && contains_word(output, &row.must_not_contain_word) {
        failures.push(format!(
            "Output contains forbidden word from: {:?}",
            row.must_not_contain_word
        ));
    }

    RulesOutcome { refusal, failures }
}

/// The text the judge sees in place of the bare prompt.
///
/// Row notes, when present, are appended under a marker so the judge can
/// use them without mistaking them for part of the question.
pub fn judge_input(row: &JudgeRow) -> String {
    match row.notes.as_deref() {
        Some(notes) if !notes.is_empty() => {
            format!("{}\n\n[NOTES FOR EVALUATION]\n{}", row.input, notes)
        }
        _ => row.input.clone(),
    }
}

/// Compare a judge's verdict with the row's threshold.
pub fn evaluate_judge(row: &JudgeRow, output: &str, verdict: JudgeVerdict) -> JudgeOutcome {
    let threshold = row.threshold();

    let mut failures = Vec::new();
    if is_blank(output) {
        failures.push(EMPTY_OUTPUT.to_string());
    }
    if verdict.score < threshold {
        failures.push(verdict.reason.clone().unwrap_or_else(|| {
            format!(
                "Relevancy score {:.3} below threshold {:.3}",
                verdict.score, threshold
            )
        }));
    }

    JudgeOutcome {
        verdict,
        threshold,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RowId;

    fn golden(expected: &str, threshold: Option<f64>) -> GoldenRow {
        GoldenRow {
            id: None,
            input: "question".into(),
            expected: expected.into(),
            f1_threshold: threshold,
        }
    }

    fn rules() -> RuleRow {
        RuleRow {
            input: "question".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_case_id_format() {
        let case = TestCase {
            test_set: "common_sense".into(),
            dataset: "golden.jsonl".into(),
            row: Row::Golden(GoldenRow {
                id: Some(RowId::Number(3.into())),
                ..golden("a", None)
            }),
        };
        assert_eq!(case.case_id(), "common_sense::golden::3");
        assert_eq!(case.prompt(), "question");
    }

    #[test]
    fn test_golden_pass_and_fail() {
        let row = golden("Warszawa to stolica Polski", None);
        assert!(evaluate_golden(&row, "Warszawa jest stolicą Polski").passed());

        let outcome = evaluate_golden(&row, "Nie mam pojęcia");
        assert!(!outcome.passed());
        assert!(outcome.failures()[0].starts_with("Golden mismatch: f1=0.000"));
    }

    #[test]
    fn test_golden_custom_threshold() {
        let row = golden("Warszawa to stolica Polski", Some(0.9));
        let outcome = evaluate_golden(&row, "Warszawa jest stolicą Polski");
        assert_eq!(outcome.threshold, 0.9);
        assert!(!outcome.passed());
    }

    #[test]
    fn test_golden_empty_output() {
        let outcome = evaluate_golden(&golden("anything", None), "  \n");
        assert_eq!(outcome.failures(), &[EMPTY_OUTPUT.to_string()]);
        assert_eq!(outcome.score, ScoreResult::ZERO);
    }

    #[test]
    fn test_rules_all_satisfied() {
        let row = RuleRow {
            must_contain_any: vec!["Warszawa".into(), "Warsaw".into()],
            must_not_contain_any: vec!["Kraków".into()],
            must_contain_word: vec!["stolica".into()],
            must_not_contain_word: vec!["cat".into()],
            ..rules()
        };
        let outcome = evaluate_rules(&row, "Stolica to WARSZAWA. Category: geography");
        assert!(outcome.passed(), "{:?}", outcome.failures());
        assert!(outcome.refusal.is_none());
    }

    #[test]
    fn test_rules_collect_every_failure() {
        let row = RuleRow {
            must_contain_any: vec!["Paris".into()],
            must_not_contain_any: vec!["berlin".into()],
            ..rules()
        };
        let outcome = evaluate_rules(&row, "Sorry, Berlin maybe?");
        assert_eq!(outcome.refusal.as_deref(), Some("sorry"));
        assert_eq!(outcome.failures().len(), 3);
        assert_eq!(outcome.failures()[0], REFUSAL_OUTPUT);
        assert!(outcome.failures()[1].contains("contain any of"));
        assert!(outcome.failures()[2].contains("forbidden phrase"));
    }

    #[test]
    fn test_rules_whole_word_checks() {
        let row = RuleRow {
            must_contain_word: vec!["cat".into()],
            ..rules()
        };
        assert!(!evaluate_rules(&row, "category theory").passed());
        assert!(evaluate_rules(&row, "the cat sat").passed());

        let row = RuleRow {
            must_not_contain_word: vec!["cat".into()],
            ..rules()
        };
        assert!(evaluate_rules(&row, "category theory").passed());
        assert!(!evaluate_rules(&row, "a cat").passed());
    }

    #[test]
    fn test_rules_custom_refusal_detector() {
        let detector = RefusalDetector::new(["je refuse"]);
        let outcome = evaluate_rules_with(&rules(), "Sorry, here it is", &detector);
        assert!(outcome.passed());
        let outcome = evaluate_rules_with(&rules(), "Je refuse.", &detector);
        assert!(!outcome.passed());
    }

    #[test]
    fn test_judge_input_with_notes() {
        let row = JudgeRow {
            id: None,
            input: "Opisz Kraków".into(),
            notes: Some("Mention Wawel".into()),
            threshold: None,
        };
        assert_eq!(
            judge_input(&row),
            "Opisz Kraków\n\n[NOTES FOR EVALUATION]\nMention Wawel"
        );

        let bare = JudgeRow { notes: None, ..row };
        assert_eq!(judge_input(&bare), "Opisz Kraków");
    }

    #[test]
    fn test_evaluate_judge() {
        let row = JudgeRow {
            id: None,
            input: "q".into(),
            notes: None,
            threshold: None,
        };
        let pass = evaluate_judge(
            &row,
            "answer",
            JudgeVerdict {
                score: 0.6,
                reason: None,
            },
        );
        assert!(pass.passed());

        let fail = evaluate_judge(
            &row,
            "answer",
            JudgeVerdict {
                score: 0.2,
                reason: Some("Off topic".into()),
            },
        );
        assert_eq!(fail.failures(), &["Off topic".to_string()]);
    }
}

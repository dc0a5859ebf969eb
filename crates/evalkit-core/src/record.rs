//! Per-case records and suite reports.
//!
//! A [`CaseRecord`] captures everything needed to review one case after the
//! fact: prompt, output, verdict, and the kind-specific numbers behind it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::{GoldenOutcome, JudgeOutcome, RulesOutcome, TestCase};
use crate::dataset::{DatasetKind, Row};

const RULE: usize = 100;

/// Round a score to 4 decimal places for reporting.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Final status of one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped { reason: String },
    Errored { message: String },
}

impl CaseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Passed => "PASSED",
            CaseStatus::Failed => "FAILED",
            CaseStatus::Skipped { .. } => "SKIPPED",
            CaseStatus::Errored { .. } => "ERROR",
        }
    }
}

/// Kind-specific details of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaseDetails {
    /// Scores are absent when the case never produced an output to score.
    Golden {
        expected: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        f1: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recall: Option<f64>,
        threshold: f64,
    },
    Rules {
        must_contain_any: Vec<String>,
        must_not_contain_any: Vec<String>,
        must_contain_word: Vec<String>,
        must_not_contain_word: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        refusal: Option<String>,
    },
    Judge {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        judge_model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        judge_metric: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score: Option<f64>,
        threshold: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl CaseDetails {
    /// Details for a row before (or without) a verdict.
    pub fn for_row(row: &Row) -> Self {
        match row {
            Row::Golden(r) => CaseDetails::Golden {
                expected: r.expected.clone(),
                f1: None,
                precision: None,
                recall: None,
                threshold: r.threshold(),
            },
            Row::Rules(r) => CaseDetails::Rules {
                must_contain_any: r.must_contain_any.clone(),
                must_not_contain_any: r.must_not_contain_any.clone(),
                must_contain_word: r.must_contain_word.clone(),
                must_not_contain_word: r.must_not_contain_word.clone(),
                refusal: None,
            },
            Row::Judge(r) => CaseDetails::Judge {
                notes: r.notes.clone(),
                judge_model: None,
                judge_metric: None,
                score: None,
                threshold: r.threshold(),
                reason: None,
            },
        }
    }

    /// `(key, value)` pairs for console rendering.
    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CaseDetails::Golden {
                expected,
                f1,
                precision,
                recall,
                threshold,
            } => {
                let mut fields = vec![
                    ("type", "golden".to_string()),
                    ("expected", expected.clone()),
                ];
                let scores = [("f1", f1), ("precision", precision), ("recall", recall)];
                fields.extend(
                    scores
                        .into_iter()
                        .filter_map(|(k, v)| v.map(|v| (k, v.to_string()))),
                );
                fields.push(("threshold", threshold.to_string()));
                fields
            }
            CaseDetails::Rules {
                must_contain_any,
                must_not_contain_any,
                must_contain_word,
                must_not_contain_word,
                refusal,
            } => {
                let mut fields = vec![
                    ("type", "rules".to_string()),
                    ("must_contain_any", format!("{:?}", must_contain_any)),
                    ("must_not_contain_any", format!("{:?}", must_not_contain_any)),
                    ("must_contain_word", format!("{:?}", must_contain_word)),
                    ("must_not_contain_word", format!("{:?}", must_not_contain_word)),
                ];
                if let Some(phrase) = refusal {
                    fields.push(("refusal", phrase.clone()));
                }
                fields
            }
            CaseDetails::Judge {
                notes,
                judge_model,
                judge_metric,
                score,
                threshold,
                reason,
            } => {
                let mut fields = vec![("type", "judge".to_string())];
                let optional = [
                    ("notes", notes.clone()),
                    ("judge_model", judge_model.clone()),
                    ("judge_metric", judge_metric.clone()),
                    ("judge_score", score.map(|s| s.to_string())),
                    ("judge_threshold", Some(threshold.to_string())),
                    ("judge_reason", reason.clone()),
                ];
                fields.extend(optional.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
                fields
            }
        }
    }
}

/// The recorded result of one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: String,
    pub test_set: String,
    pub dataset: String,
    pub kind: DatasetKind,
    pub prompt: String,

    /// Model output; absent when the model call failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(flatten)]
    pub status: CaseStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,

    pub details: CaseDetails,

    pub evaluated_at: DateTime<Utc>,
}

impl CaseRecord {
    fn base(case: &TestCase, output: Option<String>, status: CaseStatus) -> Self {
        Self {
            case_id: case.case_id(),
            test_set: case.test_set.clone(),
            dataset: case.dataset.clone(),
            kind: case.kind(),
            prompt: case.prompt().to_string(),
            output,
            status,
            failures: Vec::new(),
            details: CaseDetails::for_row(&case.row),
            evaluated_at: Utc::now(),
        }
    }

    fn verdict(failures: &[String]) -> CaseStatus {
        if failures.is_empty() {
            CaseStatus::Passed
        } else {
            CaseStatus::Failed
        }
    }

    pub fn golden(case: &TestCase, output: &str, outcome: &GoldenOutcome) -> Self {
        let mut record = Self::base(case, Some(output.to_string()), Self::verdict(&outcome.failures));
        if let CaseDetails::Golden {
            f1,
            precision,
            recall,
            ..
        } = &mut record.details
        {
            *f1 = Some(round4(outcome.score.f1));
            *precision = Some(round4(outcome.score.precision));
            *recall = Some(round4(outcome.score.recall));
        }
        record.failures = outcome.failures.clone();
        record
    }

    pub fn rules(case: &TestCase, output: &str, outcome: &RulesOutcome) -> Self {
        let mut record = Self::base(case, Some(output.to_string()), Self::verdict(&outcome.failures));
        if let CaseDetails::Rules { refusal, .. } = &mut record.details {
            refusal.clone_from(&outcome.refusal);
        }
        record.failures = outcome.failures.clone();
        record
    }

    /// `model` and `metric` name the judge that produced the verdict.
    pub fn judge(
        case: &TestCase,
        output: &str,
        outcome: &JudgeOutcome,
        model: Option<&str>,
        metric: Option<&str>,
    ) -> Self {
        let mut record = Self::base(case, Some(output.to_string()), Self::verdict(&outcome.failures));
        if let CaseDetails::Judge {
            judge_model,
            judge_metric,
            score,
            reason,
            ..
        } = &mut record.details
        {
            *judge_model = model.map(str::to_string);
            *judge_metric = metric.map(str::to_string);
            *score = Some(round4(outcome.verdict.score));
            reason.clone_from(&outcome.verdict.reason);
        }
        record.failures = outcome.failures.clone();
        record
    }

    pub fn skipped(case: &TestCase, reason: impl Into<String>) -> Self {
        Self::base(
            case,
            None,
            CaseStatus::Skipped {
                reason: reason.into(),
            },
        )
    }

    /// A case whose model or judge call failed. `output` is kept if the
    /// model answered before the failure.
    pub fn errored(case: &TestCase, output: Option<String>, message: impl Into<String>) -> Self {
        Self::base(
            case,
            output,
            CaseStatus::Errored {
                message: message.into(),
            },
        )
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }

    /// Render the record as a banner block for console output.
    pub fn render(&self) -> String {
        let heavy = "=".repeat(RULE);
        let light = "-".repeat(RULE);

        let mut lines = vec![
            heavy.clone(),
            format!("CASE: {}", self.case_id),
            format!("STATUS: {}", self.status.label()),
            light.clone(),
            "PROMPT:".to_string(),
            self.prompt.clone(),
            light.clone(),
        ];

        if let Some(output) = &self.output {
            lines.push("OUTPUT:".to_string());
            lines.push(output.clone());
            lines.push(light.clone());
        }

        match &self.status {
            CaseStatus::Skipped { reason } => lines.push(format!("SKIPPED: {}", reason)),
            CaseStatus::Errored { message } => lines.push(format!("ERROR: {}", message)),
            _ => {}
        }
        for failure in &self.failures {
            lines.push(format!("FAILURE: {}", failure));
        }

        lines.push("EXTRA:".to_string());
        lines.push(format!("test_set: {}", self.test_set));
        lines.push(format!("dataset: {}", self.dataset));
        for (key, value) in self.details.fields() {
            lines.push(format!("{}: {}", key, value));
        }
        lines.push(heavy);

        lines.join("\n")
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl std::fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped, {} errors ({} total)",
            self.passed, self.failed, self.skipped, self.errored, self.total
        )
    }
}

/// All case records of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: SuiteSummary,
    pub records: Vec<CaseRecord>,
}

impl SuiteReport {
    pub fn new(started_at: DateTime<Utc>, records: Vec<CaseRecord>) -> Self {
        let summary = summarize(&records);
        Self {
            started_at,
            finished_at: Utc::now(),
            summary,
            records,
        }
    }

    /// True when nothing failed or errored. Skipped cases do not count
    /// against the run.
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.errored == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.status, CaseStatus::Failed | CaseStatus::Errored { .. }))
    }
}

fn summarize(records: &[CaseRecord]) -> SuiteSummary {
    let mut summary = SuiteSummary {
        total: records.len(),
        ..Default::default()
    };
    for record in records {
        match record.status {
            CaseStatus::Passed => summary.passed += 1,
            CaseStatus::Failed => summary.failed += 1,
            CaseStatus::Skipped { .. } => summary.skipped += 1,
            CaseStatus::Errored { .. } => summary.errored += 1,
        }
    }
    summary
}

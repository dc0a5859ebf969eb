//! Typed dataset rows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::golden::DEFAULT_F1_THRESHOLD;

/// Default minimum relevancy score for a judge case to pass.
pub const DEFAULT_JUDGE_THRESHOLD: f64 = 0.60;

/// Placeholder used in case ids when a row has no `id`.
pub const NO_ID: &str = "no_id";

/// Which kind of check a dataset drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Golden,
    Rules,
    Judge,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [DatasetKind::Rules, DatasetKind::Golden, DatasetKind::Judge];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Golden => "golden",
            DatasetKind::Rules => "rules",
            DatasetKind::Judge => "judge",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "golden" => Ok(DatasetKind::Golden),
            "rules" => Ok(DatasetKind::Rules),
            "judge" => Ok(DatasetKind::Judge),
            other => Err(format!(
                "unknown dataset kind '{}', expected one of: golden, rules, judge",
                other
            )),
        }
    }
}

/// Row identifier; datasets use both strings and numbers.
///
/// Numbers keep their JSON form, so `7`, `7.0` and `18446744073709551615`
/// render as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Text(s) => f.write_str(s),
            RowId::Number(n) => write!(f, "{}", n),
        }
    }
}

fn case_key(id: Option<&RowId>) -> String {
    id.map(ToString::to_string)
        .unwrap_or_else(|| NO_ID.to_string())
}

/// A golden row: the output is scored against `expected` with token F1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,

    /// Prompt sent to the model
    pub input: String,

    /// Reference answer
    pub expected: String,

    /// Minimum F1 to pass; [`DEFAULT_F1_THRESHOLD`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f1_threshold: Option<f64>,
}

impl GoldenRow {
    pub fn threshold(&self) -> f64 {
        self.f1_threshold.unwrap_or(DEFAULT_F1_THRESHOLD)
    }

    pub fn case_key(&self) -> String {
        case_key(self.id.as_ref())
    }
}

/// A rule row: phrase and word containment checks plus refusal detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,

    pub input: String,

    /// At least one of these must appear (substring match)
    #[serde(default)]
    pub must_contain_any: Vec<String>,

    /// None of these may appear (substring match)
    #[serde(default)]
    pub must_not_contain_any: Vec<String>,

    /// At least one of these must appear as a whole word
    #[serde(default)]
    pub must_contain_word: Vec<String>,

    /// None of these may appear as a whole word
    #[serde(default)]
    pub must_not_contain_word: Vec<String>,
}

impl RuleRow {
    pub fn case_key(&self) -> String {
        case_key(self.id.as_ref())
    }
}

/// A judge row: a second model rates the relevancy of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,

    pub input: String,

    /// Extra guidance appended to the judge's view of the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Minimum relevancy score; [`DEFAULT_JUDGE_THRESHOLD`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl JudgeRow {
    pub fn threshold(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_JUDGE_THRESHOLD)
    }

    pub fn case_key(&self) -> String {
        case_key(self.id.as_ref())
    }
}

/// A row of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Golden(GoldenRow),
    Rules(RuleRow),
    Judge(JudgeRow),
}

impl Row {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Row::Golden(_) => DatasetKind::Golden,
            Row::Rules(_) => DatasetKind::Rules,
            Row::Judge(_) => DatasetKind::Judge,
        }
    }

    /// The prompt for the model.
    pub fn input(&self) -> &str {
        match self {
            Row::Golden(r) => &r.input,
            Row::Rules(r) => &r.input,
            Row::Judge(r) => &r.input,
        }
    }

    pub fn case_key(&self) -> String {
        match self {
            Row::Golden(r) => r.case_key(),
            Row::Rules(r) => r.case_key(),
            Row::Judge(r) => r.case_key(),
        }
    }
}

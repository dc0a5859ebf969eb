//! Dataset loading.
//!
//! Datasets are JSONL files: one JSON object per line, blank lines and
//! lines starting with `#` ignored. Every row is validated against the
//! schema for its kind before it is deserialized into a typed row, so
//! malformed rows are rejected at load time with their line number.

mod rows;
mod schema;

pub use rows::{
    DatasetKind, GoldenRow, JudgeRow, Row, RowId, RuleRow, DEFAULT_JUDGE_THRESHOLD, NO_ID,
};
pub use schema::validate_row;

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::case::TestCase;

/// Errors that can occur when loading a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSONL at {path} line {line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Schema validation failed at {path} line {line}: {}", .errors.join("; "))]
    Schema {
        path: PathBuf,
        line: usize,
        errors: Vec<String>,
    },
}

/// Parse JSONL text into `(line number, value)` pairs.
///
/// Line numbers are 1-based. Blank lines and `#` comments are skipped.
pub fn read_jsonl(text: &str, path: &Path) -> Result<Vec<(usize, serde_json::Value)>, DatasetError> {
    let mut values = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let value = serde_json::from_str(line).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        values.push((index + 1, value));
    }

    Ok(values)
}

/// Parse, validate, and deserialize the rows of a `kind` dataset.
pub fn load_rows<T: DeserializeOwned>(
    text: &str,
    kind: DatasetKind,
    path: &Path,
) -> Result<Vec<T>, DatasetError> {
    read_jsonl(text, path)?
        .into_iter()
        .map(|(line, value)| {
            validate_row(kind, &value).map_err(|errors| DatasetError::Schema {
                path: path.to_path_buf(),
                line,
                errors,
            })?;

            serde_json::from_value(value).map_err(|source| DatasetError::Json {
                path: path.to_path_buf(),
                line,
                source,
            })
        })
        .collect()
}

/// A loaded dataset: every row of one kind from one file.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Name of the test set this dataset belongs to
    pub test_set: String,

    pub kind: DatasetKind,

    /// File the rows were read from
    pub source: PathBuf,

    pub rows: Vec<Row>,
}

impl Dataset {
    /// Parse a dataset from JSONL text.
    pub fn from_jsonl(
        text: &str,
        kind: DatasetKind,
        test_set: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Result<Self, DatasetError> {
        let source = source.into();
        let rows = match kind {
            DatasetKind::Golden => load_rows::<GoldenRow>(text, kind, &source)?
                .into_iter()
                .map(Row::Golden)
                .collect(),
            DatasetKind::Rules => load_rows::<RuleRow>(text, kind, &source)?
                .into_iter()
                .map(Row::Rules)
                .collect(),
            DatasetKind::Judge => load_rows::<JudgeRow>(text, kind, &source)?
                .into_iter()
                .map(Row::Judge)
                .collect(),
        };

        Ok(Self {
            test_set: test_set.into(),
            kind,
            source,
            rows,
        })
    }

    /// Load a dataset from a JSONL file.
    pub fn from_file(
        path: impl AsRef<Path>,
        kind: DatasetKind,
        test_set: impl Into<String>,
    ) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dataset = Self::from_jsonl(&text, kind, test_set, path)?;
        tracing::debug!(
            path = %path.display(),
            kind = %kind,
            rows = dataset.rows.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// File name of the source, used in reports.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// One test case per row, in file order.
    pub fn cases(&self) -> Vec<TestCase> {
        let dataset = self.file_name();
        self.rows
            .iter()
            .map(|row| TestCase {
                test_set: self.test_set.clone(),
                dataset: dataset.clone(),
                row: row.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

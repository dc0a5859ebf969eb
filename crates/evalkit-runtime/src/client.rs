//! Model client abstraction.
//!
//! The model under test is reached through [`ModelClient`]. Transport is the
//! implementor's concern; this crate ships only [`ReplayClient`], which
//! serves outputs recorded earlier.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use evalkit_core::dataset::read_jsonl;
use evalkit_core::DatasetError;

/// Errors from model clients and judges.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Model call failed: {0}")]
    CallFailed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("No recorded output for prompt: {0}")]
    MissingOutput(String),

    #[error("Invalid judge response: {0}")]
    InvalidVerdict(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// The model under evaluation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a single user prompt and return the model's text response.
    async fn complete(&self, prompt: &str) -> Result<String, ClientError>;

    /// Model name for reports.
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct RecordedOutput {
    input: String,
    output: String,
}

/// Serves recorded outputs keyed by prompt.
///
/// Recordings are JSONL rows of `{"input": ..., "output": ...}`. When a
/// prompt appears more than once, the last recording wins.
#[derive(Debug, Clone, Default)]
pub struct ReplayClient {
    name: String,
    outputs: HashMap<String, String>,
}

impl ReplayClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outputs: HashMap::new(),
        }
    }

    /// Record `output` as the response to `prompt`.
    pub fn with_output(mut self, prompt: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs.insert(prompt.into(), output.into());
        self
    }

    /// Load recordings from JSONL text.
    pub fn from_jsonl(
        name: impl Into<String>,
        text: &str,
        source: &Path,
    ) -> Result<Self, ClientError> {
        let mut client = Self::new(name);
        for (line, value) in read_jsonl(text, source)? {
            let recorded: RecordedOutput =
                serde_json::from_value(value).map_err(|source_err| DatasetError::Json {
                    path: source.to_path_buf(),
                    line,
                    source: source_err,
                })?;
            client.outputs.insert(recorded.input, recorded.output);
        }
        Ok(client)
    }

    /// Load recordings from a JSONL file; the client is named after the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_stem()
            .map(|s| format!("replay:{}", s.to_string_lossy()))
            .unwrap_or_else(|| "replay".to_string());

        let client = Self::from_jsonl(name, &text, path)?;
        tracing::debug!(path = %path.display(), outputs = client.len(), "replay outputs loaded");
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[async_trait]
impl ModelClient for ReplayClient {
    async fn complete(&self, prompt: &str) -> Result<String, ClientError> {
        self.outputs
            .get(prompt)
            .map(|output| output.trim().to_string())
            .ok_or_else(|| ClientError::MissingOutput(prompt.to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_replay_returns_trimmed_output() {
        let client = ReplayClient::new("replay").with_output("2+2?", "  4\n");
        assert_eq!(client.complete("2+2?").await.unwrap(), "4");
        assert_eq!(client.name(), "replay");
    }

    #[tokio::test]
    async fn test_replay_missing_prompt() {
        let client = ReplayClient::new("replay");
        let err = client.complete("unknown").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingOutput(p) if p == "unknown"));
    }

    #[test]
    fn test_from_jsonl_last_recording_wins() {
        let text = r#"
{"input": "a", "output": "first"}
# re-run
{"input": "a", "output": "second", "latency_ms": 812}
{"input": "b", "output": "other"}
"#;
        let client = ReplayClient::from_jsonl("r", text, Path::new("outputs.jsonl")).unwrap();
        assert_eq!(client.len(), 2);
        assert_eq!(client.outputs["a"], "second");
    }

    #[test]
    fn test_from_jsonl_missing_field_reports_line() {
        let text = "{\"input\": \"a\"}\n";
        let err = ReplayClient::from_jsonl("r", text, Path::new("outputs.jsonl")).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Dataset(DatasetError::Json { line: 1, .. })
        ));
    }

    #[test]
    fn test_from_file_names_client() {
        let mut file = tempfile::Builder::new()
            .prefix("bielik-run")
            .suffix(".jsonl")
            .tempfile()
            .unwrap();
        writeln!(file, "{{\"input\": \"q\", \"output\": \"a\"}}").unwrap();

        let client = ReplayClient::from_file(file.path()).unwrap();
        assert!(client.name().starts_with("replay:bielik-run"));
        assert!(!client.is_empty());
    }
}

//! Relevancy judge abstraction.
//!
//! A judge is a second model that rates how relevant an output is to its
//! prompt. The judge sees [`evalkit_core::judge_input`], i.e. the prompt
//! with any row notes appended.

use async_trait::async_trait;

use evalkit_core::JudgeVerdict;

use crate::client::ClientError;

#[async_trait]
pub trait RelevancyJudge: Send + Sync {
    /// Rate `actual_output` as an answer to `input`.
    ///
    /// Implementations must return a score in `[0, 1]`; out-of-range
    /// scores are rejected by the runner.
    async fn measure(&self, input: &str, actual_output: &str) -> Result<JudgeVerdict, ClientError>;

    /// Judge model name for reports.
    fn model_name(&self) -> &str;

    /// Metric name for reports.
    fn metric_name(&self) -> &str {
        "answer_relevancy"
    }
}

/// Reject verdicts whose score is outside `[0, 1]`.
pub(crate) fn check_verdict(verdict: JudgeVerdict) -> Result<JudgeVerdict, ClientError> {
    if (0.0..=1.0).contains(&verdict.score) {
        Ok(verdict)
    } else {
        Err(ClientError::InvalidVerdict(format!(
            "score {} outside [0, 1]",
            verdict.score
        )))
    }
}

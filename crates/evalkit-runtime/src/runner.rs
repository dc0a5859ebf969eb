//! Suite runner.
//!
//! Drives a list of test cases through the model client (and the judge for
//! judge cases), then hands each output to the deterministic evaluators in
//! `evalkit-core`.
//!
//! - Every model and judge call is bounded by `call_timeout`
//! - Up to `concurrency` cases are in flight; the report keeps input order
//! - A failed call produces an `Errored` record and the run continues
//! - Judge cases are skipped when no judge is configured

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use thiserror::Error;

use evalkit_core::{
    evaluate_golden, evaluate_judge, evaluate_rules_with, judge_input, CaseRecord, JudgeRow,
    RefusalDetector, Row, SuiteReport, TestCase,
};

use crate::client::{ClientError, ModelClient};
use crate::config::RunnerConfig;
use crate::judge::{check_verdict, RelevancyJudge};

pub const NO_JUDGE_REASON: &str = "no relevancy judge configured";

/// Errors from building a runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Model client not configured")]
    ClientNotConfigured,
}

/// Runs test cases against a model.
pub struct SuiteRunner {
    client: Arc<dyn ModelClient>,
    judge: Option<Arc<dyn RelevancyJudge>>,
    refusals: RefusalDetector,
    config: RunnerConfig,
}

impl SuiteRunner {
    /// Create a runner with default refusal hints and no judge.
    pub fn new(client: Arc<dyn ModelClient>, config: RunnerConfig) -> Self {
        Self {
            client,
            judge: None,
            refusals: RefusalDetector::default(),
            config,
        }
    }

    pub fn builder() -> SuiteRunnerBuilder {
        SuiteRunnerBuilder::new()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn has_judge(&self) -> bool {
        self.judge.is_some()
    }

    /// Run every case and collect the records in input order.
    pub async fn run(&self, cases: &[TestCase]) -> SuiteReport {
        let started_at = Utc::now();
        tracing::info!(
            cases = cases.len(),
            client = self.client.name(),
            concurrency = self.config.concurrency,
            "suite started"
        );

        let records: Vec<CaseRecord> = stream::iter(cases)
            .map(|case| self.run_case(case))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let report = SuiteReport::new(started_at, records);
        tracing::info!(summary = %report.summary, "suite finished");
        report
    }

    /// Run a single case.
    pub async fn run_case(&self, case: &TestCase) -> CaseRecord {
        let case_id = case.case_id();

        if matches!(case.row, Row::Judge(_)) && self.judge.is_none() {
            tracing::debug!(case = %case_id, "skipping judge case");
            return CaseRecord::skipped(case, NO_JUDGE_REASON);
        }

        let output = match self.bounded(self.client.complete(case.prompt())).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(case = %case_id, error = %e, "model call failed");
                return CaseRecord::errored(case, None, e.to_string());
            }
        };

        let record = match &case.row {
            Row::Golden(row) => CaseRecord::golden(case, &output, &evaluate_golden(row, &output)),
            Row::Rules(row) => CaseRecord::rules(
                case,
                &output,
                &evaluate_rules_with(row, &output, &self.refusals),
            ),
            Row::Judge(row) => self.run_judge(case, row, output).await,
        };

        tracing::debug!(case = %case_id, status = record.status.label(), "case evaluated");
        record
    }

    async fn run_judge(&self, case: &TestCase, row: &JudgeRow, output: String) -> CaseRecord {
        let Some(judge) = &self.judge else {
            return CaseRecord::skipped(case, NO_JUDGE_REASON);
        };

        let input = judge_input(row);
        let verdict = self
            .bounded(judge.measure(&input, &output))
            .await
            .and_then(check_verdict);

        match verdict {
            Ok(verdict) => {
                let outcome = evaluate_judge(row, &output, verdict);
                CaseRecord::judge(
                    case,
                    &output,
                    &outcome,
                    Some(judge.model_name()),
                    Some(judge.metric_name()),
                )
            }
            Err(e) => {
                tracing::warn!(case = %case.case_id(), judge = judge.model_name(), error = %e, "judge call failed");
                CaseRecord::errored(case, Some(output), e.to_string())
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let timeout = self.config.call_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(timeout)),
        }
    }
}

/// Builder for [`SuiteRunner`].
pub struct SuiteRunnerBuilder {
    client: Option<Arc<dyn ModelClient>>,
    judge: Option<Arc<dyn RelevancyJudge>>,
    refusals: RefusalDetector,
    config: RunnerConfig,
}

impl SuiteRunnerBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            judge: None,
            refusals: RefusalDetector::default(),
            config: RunnerConfig::default(),
        }
    }

    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn judge(mut self, judge: Arc<dyn RelevancyJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Replace the default refusal hints.
    pub fn refusals(mut self, refusals: RefusalDetector) -> Self {
        self.refusals = refusals;
        self
    }

    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<SuiteRunner, RunnerError> {
        let client = self.client.ok_or(RunnerError::ClientNotConfigured)?;

        Ok(SuiteRunner {
            client,
            judge: self.judge,
            refusals: self.refusals,
            config: self.config,
        })
    }
}

impl Default for SuiteRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

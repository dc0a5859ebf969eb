//! # evalkit-runtime
//!
//! Runs evaluation suites against a model.
//!
//! `evalkit-core` decides pass or fail for a given output; this crate
//! obtains those outputs. The model under test and the optional relevancy
//! judge are injected through the [`ModelClient`] and [`RelevancyJudge`]
//! traits, so any transport can be plugged in.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use evalkit_core::{Dataset, DatasetKind};
//! use evalkit_runtime::{ReplayClient, RunnerConfig, SuiteRunner};
//!
//! let dataset = Dataset::from_file("sets/geo/golden.jsonl", DatasetKind::Golden, "geo")?;
//! let client = Arc::new(ReplayClient::from_file("outputs.jsonl")?);
//!
//! let runner = SuiteRunner::new(client, RunnerConfig::from_env()?);
//! let report = runner.run(&dataset.cases()).await;
//! println!("{}", report.summary);
//! ```

pub mod client;
pub mod config;
pub mod judge;
pub mod runner;

pub use client::{ClientError, ModelClient, ReplayClient};
pub use config::{ConfigError, RunnerConfig};
pub use judge::RelevancyJudge;
pub use runner::{RunnerError, SuiteRunner, SuiteRunnerBuilder, NO_JUDGE_REASON};

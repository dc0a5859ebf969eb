//! Runner configuration.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Per-call timeout, humantime format (`"90s"`, `"3m"`).
pub const TIMEOUT_ENV: &str = "EVALKIT_TIMEOUT";
/// Maximum cases in flight.
pub const CONCURRENCY_ENV: &str = "EVALKIT_CONCURRENCY";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Configuration for [`SuiteRunner`](crate::SuiteRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Timeout applied to each model and judge call
    pub call_timeout: Duration,

    /// Maximum cases evaluated concurrently (at least 1)
    pub concurrency: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(180),
            concurrency: 1,
        }
    }
}

impl RunnerConfig {
    /// Build a config from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = non_empty(TIMEOUT_ENV) {
            config.call_timeout =
                humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidValue {
                    var: TIMEOUT_ENV,
                    message: e.to_string(),
                })?;
        }

        if let Some(raw) = non_empty(CONCURRENCY_ENV) {
            let parsed: usize = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: CONCURRENCY_ENV,
                    message: e.to_string(),
                }
            })?;
            config = config.with_concurrency(parsed);
        }

        Ok(config)
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set concurrency; zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

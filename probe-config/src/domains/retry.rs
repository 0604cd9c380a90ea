//! Retry configuration for the request executor

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Whether requests are retried at all
    #[serde(default = "crate::domains::utils::default_false")]
    pub enabled: bool,

    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        rename = "initial_delay_ms",
        default = "default_initial_delay"
    )]
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        rename = "max_delay_ms",
        default = "default_max_delay"
    )]
    pub max_delay: Duration,

    #[serde(default)]
    pub backoff: BackoffKind,

    /// Add ±20% jitter to each delay
    #[serde(default = "crate::domains::utils::default_false")]
    pub jitter: bool,
}

/// Backoff growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    Fixed,
    #[default]
    Linear,
    Exponential,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff: BackoffKind::Linear,
            jitter: false,
        }
    }
}

impl Validatable for RetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_attempts, "max_attempts", self.domain_name())?;

        if self.max_delay < self.initial_delay {
            return Err(self.validation_error("max_delay_ms must not be below initial_delay_ms"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "retry"
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults() {
        let config = RetryConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.backoff, BackoffKind::Linear);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_validation() {
        let config = RetryConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RetryConfig {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

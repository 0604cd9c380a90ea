//! Readiness verdict thresholds

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_ratio, Validatable};
use serde::{Deserialize, Serialize};

/// Thresholds of the readiness ladder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// Average response time graded "good" at or below this
    #[serde(default = "default_avg_good_ms")]
    pub avg_good_ms: f64,

    /// Average response time graded "acceptable" at or below this
    #[serde(default = "default_avg_acceptable_ms")]
    pub avg_acceptable_ms: f64,

    #[serde(default = "default_error_rate_good")]
    pub error_rate_good: f64,

    #[serde(default = "default_error_rate_acceptable")]
    pub error_rate_acceptable: f64,

    /// Requests per second graded "good"; half of it is "acceptable"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_throughput: Option<f64>,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self {
            avg_good_ms: default_avg_good_ms(),
            avg_acceptable_ms: default_avg_acceptable_ms(),
            error_rate_good: default_error_rate_good(),
            error_rate_acceptable: default_error_rate_acceptable(),
            min_throughput: None,
        }
    }
}

impl Validatable for VerdictConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.avg_good_ms, "avg_good_ms", self.domain_name())?;
        if self.avg_acceptable_ms < self.avg_good_ms {
            return Err(self.validation_error("avg_acceptable_ms must not be below avg_good_ms"));
        }

        validate_ratio(self.error_rate_good, "error_rate_good", self.domain_name())?;
        validate_ratio(
            self.error_rate_acceptable,
            "error_rate_acceptable",
            self.domain_name(),
        )?;
        if self.error_rate_acceptable < self.error_rate_good {
            return Err(
                self.validation_error("error_rate_acceptable must not be below error_rate_good")
            );
        }

        if let Some(min) = self.min_throughput {
            validate_positive(min, "min_throughput", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "verdict"
    }
}

fn default_avg_good_ms() -> f64 {
    500.0
}

fn default_avg_acceptable_ms() -> f64 {
    2000.0
}

fn default_error_rate_good() -> f64 {
    0.01
}

fn default_error_rate_acceptable() -> f64 {
    0.05
}

//! Domain-specific configuration modules

pub mod http;
pub mod load;
pub mod logging;
pub mod report;
pub mod retry;
pub mod target;
pub mod utils;
pub mod verdict;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main probe configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProbeConfig {
    /// Deployment under test
    #[serde(default)]
    pub target: target::TargetConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Load generation configuration
    #[serde(default)]
    pub load: load::LoadConfig,

    /// Retry configuration
    #[serde(default)]
    pub retry: retry::RetryConfig,

    /// Readiness verdict thresholds
    #[serde(default)]
    pub verdict: verdict::VerdictConfig,

    /// Report output configuration
    #[serde(default)]
    pub report: report::ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl ProbeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.http.validate()?;
        self.load.validate()?;
        self.retry.validate()?;
        self.verdict.validate()?;
        self.report.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let mut config = ProbeConfig::default();
        config.load.endpoints.push(load::EndpointConfig {
            name: "health".to_string(),
            method: "GET".to_string(),
            path: "/health".to_string(),
            headers: Default::default(),
            body: None,
        });
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

//! Load generation configuration

use crate::error::ConfigResult;
use crate::validation::{
    validate_enum_choice, validate_positive, validate_required_string, Validatable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Load run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Name used in reports and report file names
    #[serde(default = "default_name")]
    pub name: String,

    /// Total number of requests issued across all endpoints
    #[serde(default = "default_requests")]
    pub requests: usize,

    /// How requests are scheduled
    #[serde(default)]
    pub mode: LoadModeConfig,

    /// Endpoints exercised round-robin
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

/// Scheduling mode of the concurrency driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadModeConfig {
    /// Every request in flight at once
    Parallel,

    /// Fixed-size batches with a fixed pause between them
    Batched {
        batch_size: usize,
        #[serde(
            with = "crate::domains::utils::serde_duration_ms",
            rename = "delay_ms",
            default = "default_batch_delay"
        )]
        delay: Duration,
    },

    /// Sliding window of at most `concurrency` requests
    Bounded { concurrency: usize },
}

/// A single endpoint of a load run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Label used for the per-endpoint breakdown
    pub name: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Path relative to the target base URL, or an absolute URL
    pub path: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            requests: default_requests(),
            mode: LoadModeConfig::default(),
            endpoints: Vec::new(),
        }
    }
}

impl Default for LoadModeConfig {
    fn default() -> Self {
        LoadModeConfig::Batched {
            batch_size: 10,
            delay: default_batch_delay(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.name, "name", self.domain_name())?;
        validate_positive(self.requests, "requests", self.domain_name())?;

        match &self.mode {
            LoadModeConfig::Parallel => {}
            LoadModeConfig::Batched { batch_size, .. } => {
                validate_positive(*batch_size, "mode.batch_size", self.domain_name())?;
            }
            LoadModeConfig::Bounded { concurrency } => {
                validate_positive(*concurrency, "mode.concurrency", self.domain_name())?;
            }
        }

        for endpoint in &self.endpoints {
            endpoint.validate()?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

impl Validatable for EndpointConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.name, "name", self.domain_name())?;
        validate_required_string(&self.path, "path", self.domain_name())?;
        validate_enum_choice(&self.method, &HTTP_METHODS, "method", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load.endpoints"
    }
}

// Default value functions
fn default_name() -> String {
    "load-test".to_string()
}

fn default_requests() -> usize {
    100
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_batch_delay() -> Duration {
    Duration::from_millis(100)
}

//! Scenario file format

use crate::error::{ScenarioError, ScenarioResult};
use crate::expect::Expectation;
use probe_config::AuthConfig;
use probe_http::RequestSpec;
use probe_resilience::{PollPolicy, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// A named suite of test cases against one API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    /// Overrides the configured target base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Overrides the configured authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Headers sent with every request of the scenario
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Initial template variables
    #[serde(default)]
    pub variables: Map<String, Value>,

    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<Step>,
}

/// One request of a test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub request: RequestSpec,

    /// Defaults to "the request succeeds" when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expectation>,

    /// Variable name to JSON pointer into the response body
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub capture: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<StepRetry>,

    /// Re-issue the request until `expect` holds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<WaitUntil>,
}

impl Step {
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.request.label())
    }

    pub fn expectation(&self) -> Expectation {
        self.expect.clone().unwrap_or_else(Expectation::succeeds)
    }
}

/// Retry of transport failures, 5xx and 429 with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRetry {
    pub attempts: u32,
    #[serde(
        with = "probe_config::serde_duration_ms",
        rename = "delay_ms",
        default = "default_retry_delay"
    )]
    pub delay: Duration,
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(500)
}

impl From<StepRetry> for RetryPolicy {
    fn from(retry: StepRetry) -> Self {
        RetryPolicy::linear(retry.attempts.max(1), retry.delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitUntil {
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
    #[serde(
        with = "probe_config::serde_duration_ms",
        rename = "interval_ms",
        default = "default_poll_interval"
    )]
    pub interval: Duration,
}

fn default_poll_attempts() -> u32 {
    PollPolicy::default().max_attempts
}

fn default_poll_interval() -> Duration {
    PollPolicy::default().interval
}

impl From<WaitUntil> for PollPolicy {
    fn from(wait: WaitUntil) -> Self {
        PollPolicy {
            max_attempts: wait.max_attempts,
            interval: wait.interval,
        }
    }
}

impl Scenario {
    /// Load a scenario; `.json` files are JSON, anything else YAML
    pub fn from_file(path: impl AsRef<Path>) -> ScenarioResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> ScenarioResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_json_str(content: &str) -> ScenarioResult<Self> {
        let scenario: Scenario = serde_json::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> ScenarioResult<()> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::Invalid("name cannot be empty".into()));
        }
        if self.cases.is_empty() {
            return Err(ScenarioError::Invalid(format!(
                "scenario '{}' has no cases",
                self.name
            )));
        }

        let mut ids = HashSet::new();
        for case in &self.cases {
            if case.id.trim().is_empty() {
                return Err(ScenarioError::Invalid("case id cannot be empty".into()));
            }
            if !ids.insert(case.id.as_str()) {
                return Err(ScenarioError::Invalid(format!("duplicate case id '{}'", case.id)));
            }
            if case.steps.is_empty() {
                return Err(ScenarioError::Invalid(format!("case '{}' has no steps", case.id)));
            }
            for step in &case.steps {
                if step.retry.is_some_and(|r| r.attempts == 0) {
                    return Err(ScenarioError::Invalid(format!(
                        "case '{}', step '{}': retry attempts must be at least 1",
                        case.id,
                        step.label()
                    )));
                }
            }
        }

        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url)
                .map_err(|e| ScenarioError::Invalid(format!("base_url '{}': {}", base_url, e)))?;
        }

        Ok(())
    }
}

//! HTTP client settings, handed as-is to the request executor

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How every request to the target is sent. Durations are whole seconds in
/// config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request budget: connect, send and body read
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub timeout: Duration,

    /// Budget for establishing the TCP/TLS connection alone; `timeout` still
    /// caps it
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub connect_timeout: Duration,

    /// Redirects followed before giving up; 0 reports the 3xx as is
    pub max_redirects: u32,

    pub user_agent: String,

    /// Accept self-signed certificates when false (staging targets)
    pub verify_ssl: bool,

    /// Keep-alive connections kept per host between load batches
    pub pool_max_idle_per_host: usize,

    #[serde(with = "crate::domains::utils::serde_duration")]
    pub pool_idle_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
            user_agent: format!("probe/{}", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_millis(), "timeout", self.domain_name())?;
        validate_positive(
            self.connect_timeout.as_millis(),
            "connect_timeout",
            self.domain_name(),
        )?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_positive(
            self.pool_max_idle_per_host,
            "pool_max_idle_per_host",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

//! Domain-driven configuration management for the probe harness
//!
//! Configuration is split by functional domain (target, http, load, retry,
//! verdict, report, logging), each with its own defaults and validation.
//! Files are YAML; any value can be overridden through `PROBE_*` environment
//! variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    http::HttpConfig,
    load::{EndpointConfig, LoadConfig, LoadModeConfig},
    logging::{FileLogConfig, LogFormat, LogLevel, LoggingConfig},
    report::ReportConfig,
    retry::{BackoffKind, RetryConfig},
    target::{AuthConfig, AuthMode, TargetConfig},
    verdict::VerdictConfig,
    ProbeConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_ms};

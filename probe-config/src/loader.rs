//! Configuration loading and environment variable handling

use crate::domains::load::LoadModeConfig;
use crate::domains::ProbeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "PROBE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<ProbeConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ProbeConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<ProbeConfig> {
        let mut config = ProbeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<ProbeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut ProbeConfig) -> ConfigResult<()> {
        self.apply_target_overrides(&mut config.target)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_load_overrides(&mut config.load)?;
        self.apply_retry_overrides(&mut config.retry)?;
        self.apply_report_overrides(&mut config.report)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    /// Apply target config overrides
    fn apply_target_overrides(
        &self,
        config: &mut crate::domains::target::TargetConfig,
    ) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(mode) = self.get_env_var("AUTH_MODE") {
            config.auth.mode = crate::domains::target::AuthMode::from_str(&mode)
                .map_err(|_| ConfigError::EnvError(format!("Invalid AUTH_MODE: {}", mode)))?;
        }

        if let Ok(token) = self.get_env_var("AUTH_TOKEN") {
            config.auth.token = Some(token);
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_TIMEOUT: {}", e)))?;
            config.timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(verify_ssl) = self.get_env_var("HTTP_VERIFY_SSL") {
            config.verify_ssl = verify_ssl
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_VERIFY_SSL: {}", e)))?;
        }

        Ok(())
    }

    /// Apply load config overrides
    fn apply_load_overrides(
        &self,
        config: &mut crate::domains::load::LoadConfig,
    ) -> ConfigResult<()> {
        if let Ok(requests) = self.get_env_var("LOAD_REQUESTS") {
            config.requests = requests
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid LOAD_REQUESTS: {}", e)))?;
        }

        if let Ok(batch_size) = self.get_env_var("LOAD_BATCH_SIZE") {
            let batch_size: usize = batch_size
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid LOAD_BATCH_SIZE: {}", e)))?;
            let delay = match &config.mode {
                LoadModeConfig::Batched { delay, .. } => *delay,
                _ => std::time::Duration::from_millis(100),
            };
            config.mode = LoadModeConfig::Batched { batch_size, delay };
        }

        Ok(())
    }

    /// Apply retry config overrides
    fn apply_retry_overrides(
        &self,
        config: &mut crate::domains::retry::RetryConfig,
    ) -> ConfigResult<()> {
        if let Ok(attempts) = self.get_env_var("RETRY_MAX_ATTEMPTS") {
            config.max_attempts = attempts.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid RETRY_MAX_ATTEMPTS: {}", e))
            })?;
            config.enabled = config.max_attempts > 1;
        }

        Ok(())
    }

    /// Apply report config overrides
    fn apply_report_overrides(
        &self,
        config: &mut crate::domains::report::ReportConfig,
    ) -> ConfigResult<()> {
        if let Ok(dir) = self.get_env_var("REPORT_DIR") {
            config.output_dir = dir.into();
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            let level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
            config.level = Some(level);
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

//! Target API configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The deployment every request is issued against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL joined with relative request paths
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Headers added to every request unless the request overrides them
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// Authentication applied to every request
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// How credentials are presented to the API
    #[serde(default)]
    pub mode: AuthMode,

    /// Token for `token` and `bearer` modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Authentication header schemes recognised by the target API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No authentication header
    #[default]
    None,
    /// `X-Public-Access: true`
    PublicAccess,
    /// `X-Auth-Token: <token>`
    Token,
    /// `Authorization: Bearer <token>`
    Bearer,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::PublicAccess => "public_access",
            AuthMode::Token => "token",
            AuthMode::Bearer => "bearer",
        }
    }

    /// Whether this mode needs a token to build its header
    pub fn requires_token(&self) -> bool {
        matches!(self, AuthMode::Token | AuthMode::Bearer)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(AuthMode::None),
            "public_access" | "public" => Ok(AuthMode::PublicAccess),
            "token" => Ok(AuthMode::Token),
            "bearer" => Ok(AuthMode::Bearer),
            _ => Err(format!("Invalid auth mode: {}", s)),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_headers: BTreeMap::new(),
            auth: AuthConfig::default(),
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;

        for name in self.default_headers.keys() {
            validate_required_string(name, "default_headers key", self.domain_name())?;
        }

        self.auth.validate()
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

impl Validatable for AuthConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.mode.requires_token() {
            match self.token.as_deref() {
                Some(token) => validate_required_string(token, "token", self.domain_name())?,
                None => {
                    return Err(self.validation_error(format!(
                        "auth mode '{}' requires a token",
                        self.mode
                    )))
                }
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target.auth"
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

//! Scenario errors

use std::path::PathBuf;
use thiserror::Error;

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scenario: {0}")]
    Invalid(String),

    #[error("Template '{template}' failed: {message}")]
    Template { template: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] probe_http::HttpError),
}

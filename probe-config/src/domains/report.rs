//! Report output configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how run reports are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving `*-report.json` / `*-results.json` files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Whether a JSON file is written at the end of a run
    #[serde(default = "crate::domains::utils::default_true")]
    pub write_json: bool,

    /// Include every individual request result in load reports
    #[serde(default = "crate::domains::utils::default_false")]
    pub include_results: bool,

    /// Colourise console output when attached to a terminal
    #[serde(default = "crate::domains::utils::default_true")]
    pub color: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            write_json: true,
            include_results: false,
            color: true,
        }
    }
}

impl Validatable for ReportConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.write_json {
            validate_required_string(
                &self.output_dir.to_string_lossy(),
                "output_dir",
                self.domain_name(),
            )?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "report"
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

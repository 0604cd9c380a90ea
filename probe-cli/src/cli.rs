//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use probe_http::HttpMethod;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "probe", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Base URL of the API under test, overrides `target.base_url`
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fire a batch of requests and grade the deployment
    Load(LoadArgs),

    /// Run a scenario file
    Run {
        /// Scenario file (YAML, or JSON with a .json extension)
        #[arg(long, value_name = "FILE")]
        scenario: PathBuf,

        /// Directory for the JSON results file
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Check how the API answers a CORS preflight
    Preflight(PreflightArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Args, Debug, Default)]
pub struct LoadArgs {
    /// Endpoint path, repeat for several endpoints (defaults to `load.endpoints`)
    #[arg(long = "path", value_name = "PATH")]
    pub paths: Vec<String>,

    /// Method used for every `--path`
    #[arg(long, value_name = "METHOD", default_value = "GET")]
    pub method: HttpMethod,

    /// JSON body sent with every `--path` request
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,

    /// Extra request header, repeatable
    #[arg(long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Total number of requests
    #[arg(long, value_name = "N")]
    pub requests: Option<usize>,

    /// Requests per batch
    #[arg(long, value_name = "N", conflicts_with_all = ["concurrency", "parallel"])]
    pub batch_size: Option<usize>,

    /// Pause between batches in milliseconds
    #[arg(long, value_name = "MS", conflicts_with_all = ["concurrency", "parallel"])]
    pub batch_delay_ms: Option<u64>,

    /// Keep at most N requests in flight instead of batching
    #[arg(long, value_name = "N", conflicts_with = "parallel")]
    pub concurrency: Option<usize>,

    /// Send every request at once
    #[arg(long)]
    pub parallel: bool,

    /// Run name used in reports
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Directory for the JSON report
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Keep every request result in the JSON report
    #[arg(long)]
    pub include_results: bool,
}

#[derive(Args, Debug)]
pub struct PreflightArgs {
    /// Path the browser would call
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub path: String,

    /// Origin of the calling page
    #[arg(long, value_name = "ORIGIN", required_unless_present_any = ["origins", "matrix"])]
    pub origin: Option<String>,

    /// Method of the actual request
    #[arg(long, value_name = "METHOD", default_value = "POST")]
    pub request_method: HttpMethod,

    /// Headers the actual request would carry
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub request_headers: Vec<String>,

    /// Probe the same request from each of these origins
    #[arg(long, value_name = "ORIGINS", value_delimiter = ',')]
    pub origins: Vec<String>,

    /// Also send the preflight from a hostile origin, `null` and localhost;
    /// fails only if one of them gets a wildcard answer
    #[arg(long)]
    pub matrix: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

/// Parse `Name: value` into a header pair
fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

//! `probe config`

use anyhow::{Context, Result};
use probe_config::{ConfigLoader, ProbeConfig};
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Handle configuration validation
pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        anyhow::bail!("Configuration file not found: {:?}", config_file);
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_config) => {
            println!("Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handle configuration generation
pub fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating sample configuration at: {:?}", output);

    if output.exists() && !force {
        anyhow::bail!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, render_sample()).context("Failed to write configuration file")?;

    println!("Sample configuration generated at: {:?}", output);
    println!("Validate with: probe config validate --config-file {:?}", output);

    Ok(())
}

fn render_sample() -> String {
    format!(
        "# probe configuration\n# Every value can be overridden with PROBE_* environment variables.\n{}",
        ProbeConfig::generate_sample()
    )
}

/// Handle configuration display
pub fn handle_config_show(config: &ProbeConfig, format: &str) -> Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

fn render_config(config: &ProbeConfig, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON"),
        _ => anyhow::bail!("Unknown output format: {}. Valid formats: yaml, json", format),
    }
}

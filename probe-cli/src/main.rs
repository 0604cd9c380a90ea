use anyhow::{Context, Result};
use clap::Parser;
use probe_config::{ConfigLoader, ProbeConfig, Validatable};
use probe_logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};

/// Load configuration from file or environment, then apply `--base-url`
fn load_config(config_path: Option<&PathBuf>, base_url: Option<&str>) -> Result<ProbeConfig> {
    let loader = ConfigLoader::new();
    let mut config = match config_path {
        Some(path) => loader
            .from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => loader
            .from_env()
            .context("Failed to load configuration from environment")?,
    };

    if let Some(base_url) = base_url {
        config.target.base_url = base_url.to_string();
        config
            .target
            .validate()
            .context("Invalid --base-url")?;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref(), cli.base_url.as_deref())?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging, cli.log_level.as_deref())
        .context("Failed to initialize logging")?;

    debug!("Target: {}", config.target.base_url);

    match &cli.command {
        Some(Commands::Load(args)) => commands::handle_load(&config, args).await,
        Some(Commands::Run { scenario, output }) => {
            commands::handle_run(
                &config,
                scenario,
                cli.base_url.as_deref(),
                output.as_deref(),
            )
            .await
        }
        Some(Commands::Preflight(args)) => commands::handle_preflight(&config, args).await,
        Some(Commands::Config { config_cmd }) => {
            match config_cmd {
                ConfigCommands::Validate { config_file } => {
                    commands::handle_config_validate(config_file)
                }
                ConfigCommands::Generate { output, force } => {
                    commands::handle_config_generate(output, *force)
                }
                ConfigCommands::Show { format } => commands::handle_config_show(&config, format),
            }?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}

//! `probe run`

use anyhow::{Context, Result};
use probe_config::ProbeConfig;
use probe_report::{write_suite_report, ConsoleReporter};
use probe_scenario::{executor_for, Scenario, ScenarioRunner};
use std::io;
use std::path::Path;
use std::process::ExitCode;
use tracing::{info, warn};

/// Run a scenario file. A `--base-url` given on the command line beats the
/// one in the file.
pub async fn handle_run(
    config: &ProbeConfig,
    scenario_path: &Path,
    base_url_override: Option<&str>,
    output: Option<&Path>,
) -> Result<ExitCode> {
    info!("Loading scenario from {:?}", scenario_path);
    let mut scenario = Scenario::from_file(scenario_path)
        .with_context(|| format!("Failed to load scenario {:?}", scenario_path))?;
    if let Some(base_url) = base_url_override {
        scenario.base_url = Some(base_url.to_string());
    }

    let executor = executor_for(&scenario, config).context("Failed to create HTTP executor")?;
    let report = ScenarioRunner::new(executor).run(&scenario).await;

    ConsoleReporter::for_stdout(config.report.color)
        .write_suite_report(&mut io::stdout().lock(), &report)
        .context("Failed to print scenario results")?;

    if let Some(dir) = super::report_dir(&config.report, output) {
        let path = write_suite_report(&dir, &report).context("Failed to write scenario results")?;
        println!("Results written to {}", path.display());
    }

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("{} of {} case(s) failed", report.failed, report.total);
        Ok(ExitCode::FAILURE)
    }
}

//! `probe load`

use crate::cli::LoadArgs;
use anyhow::{Context, Result};
use probe_config::ProbeConfig;
use probe_http::{HttpExecutor, RequestExecutor, RequestSpec, RetryingExecutor};
use probe_load::{DriverMode, LoadPlan, LoadRun, LoadRunner};
use probe_report::{write_load_report, ConsoleReporter, LoadReport, VerdictLabel};
use probe_resilience::RetryPolicy;
use std::io;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

pub async fn handle_load(config: &ProbeConfig, args: &LoadArgs) -> Result<ExitCode> {
    let plan = build_plan(config, args)?;
    info!(
        "Starting load run '{}': {} request(s) over {} endpoint(s), {}",
        plan.name,
        plan.requests,
        plan.endpoints.len(),
        plan.mode
    );

    let executor = HttpExecutor::from_config(config).context("Failed to create HTTP executor")?;
    let run = if config.retry.enabled {
        let policy = RetryPolicy::from(&config.retry);
        run_plan(RetryingExecutor::new(executor, policy), &plan).await?
    } else {
        run_plan(executor, &plan).await?
    };

    let include_results = args.include_results || config.report.include_results;
    let report = LoadReport::from_run(run, &config.verdict, include_results);

    ConsoleReporter::for_stdout(config.report.color)
        .write_load_report(&mut io::stdout().lock(), &report)
        .context("Failed to print load report")?;

    if let Some(dir) = super::report_dir(&config.report, args.output.as_deref()) {
        let path = write_load_report(&dir, &report).context("Failed to write load report")?;
        println!("Report written to {}", path.display());
    }

    if report.verdict.label == VerdictLabel::NotReady {
        warn!("Load run '{}' graded NOT_READY", report.name);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_plan<E: RequestExecutor>(executor: E, plan: &LoadPlan) -> Result<LoadRun> {
    LoadRunner::new(executor)
        .run(plan)
        .await
        .context("Load run failed")
}

/// Endpoints from `--path` when given, otherwise from `load.endpoints`; other
/// flags override the configured values one by one
pub fn build_plan(config: &ProbeConfig, args: &LoadArgs) -> Result<LoadPlan> {
    let mut plan = if args.paths.is_empty() {
        LoadPlan::from_config(&config.load).context("Invalid load.endpoints configuration")?
    } else {
        let body = args
            .body
            .as_deref()
            .map(|raw| serde_json::from_str::<serde_json::Value>(raw))
            .transpose()
            .context("--body must be valid JSON")?;

        let mut plan = LoadPlan::new(
            config.load.name.clone(),
            config.load.requests,
            DriverMode::from(&config.load.mode),
        );
        for path in &args.paths {
            let mut request =
                RequestSpec::new(args.method, path.clone()).named(format!("{} {}", args.method, path));
            for (name, value) in &args.headers {
                request = request.with_header(name.clone(), value.clone());
            }
            if let Some(body) = &body {
                request = request.with_body(body.clone());
            }
            plan = plan.with_endpoint(request);
        }
        plan
    };

    if plan.endpoints.is_empty() {
        anyhow::bail!("No endpoints to load: pass --path or configure load.endpoints");
    }

    if let Some(name) = &args.name {
        plan.name = name.clone();
    }
    if let Some(requests) = args.requests {
        plan.requests = requests;
    }
    plan.mode = mode_override(plan.mode, args);

    Ok(plan)
}

fn mode_override(current: DriverMode, args: &LoadArgs) -> DriverMode {
    if args.parallel {
        return DriverMode::Parallel;
    }
    if let Some(concurrency) = args.concurrency {
        return DriverMode::Bounded { concurrency };
    }
    if args.batch_size.is_none() && args.batch_delay_ms.is_none() {
        return current;
    }

    let (batch_size, delay) = match current {
        DriverMode::Batched { batch_size, delay } => (batch_size, delay),
        _ => (10, Duration::from_millis(100)),
    };
    DriverMode::Batched {
        batch_size: args.batch_size.unwrap_or(batch_size),
        delay: args
            .batch_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(delay),
    }
}

//! `probe preflight`

use crate::cli::PreflightArgs;
use anyhow::{Context, Result};
use probe_config::ProbeConfig;
use probe_http::{
    origin_matrix, HttpExecutor, PreflightReport, PreflightRequest, DEFAULT_PROBE_ORIGINS,
};
use probe_report::ConsoleReporter;
use std::io;
use std::process::ExitCode;
use tracing::warn;

pub async fn handle_preflight(config: &ProbeConfig, args: &PreflightArgs) -> Result<ExitCode> {
    let executor = HttpExecutor::from_config(config).context("Failed to create HTTP executor")?;
    let plan = OriginPlan::from_args(args);
    let request = PreflightRequest::new(args.path.clone(), plan.first_origin(), args.request_method)
        .with_headers(&args.request_headers);

    let checked = origin_matrix(&executor, &request, plan.checked.as_slice()).await;
    let matrix = origin_matrix(&executor, &request, plan.matrix.as_slice()).await;

    let mut reports = checked.clone();
    reports.extend(matrix.iter().cloned());
    ConsoleReporter::for_stdout(config.report.color)
        .write_preflight_reports(&mut io::stdout().lock(), &reports)
        .context("Failed to print preflight report")?;

    if has_failures(&checked, &matrix) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Origins to preflight. `checked` must be admitted; `matrix` holds the
/// built-in hostile/null/localhost origins added by `--matrix`, whose
/// rejection is the expected answer.
#[derive(Debug, PartialEq)]
struct OriginPlan {
    checked: Vec<String>,
    matrix: Vec<String>,
}

impl OriginPlan {
    fn from_args(args: &PreflightArgs) -> Self {
        let mut checked: Vec<String> = args.origin.iter().cloned().collect();
        for origin in &args.origins {
            if !checked.contains(origin) {
                checked.push(origin.clone());
            }
        }

        let matrix = if args.matrix {
            DEFAULT_PROBE_ORIGINS
                .iter()
                .filter(|origin| !checked.iter().any(|c| c == *origin))
                .map(|origin| origin.to_string())
                .collect()
        } else {
            Vec::new()
        };

        Self { checked, matrix }
    }

    fn first_origin(&self) -> String {
        self.checked
            .first()
            .or_else(|| self.matrix.first())
            .cloned()
            .unwrap_or_default()
    }
}

/// A checked origin was rejected, or a matrix origin got a wildcard answer
fn has_failures(checked: &[PreflightReport], matrix: &[PreflightReport]) -> bool {
    let rejected = checked.iter().filter(|r| !r.is_allowed()).count();
    if rejected > 0 {
        warn!("{} of {} preflight(s) rejected", rejected, checked.len());
    }

    let permissive: Vec<&str> = matrix
        .iter()
        .filter(|r| r.permissive_origin)
        .map(|r| r.origin.as_str())
        .collect();
    if !permissive.is_empty() {
        warn!("Wildcard Access-Control-Allow-Origin for {}", permissive.join(", "));
    }

    rejected > 0 || !permissive.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use probe_http::{CorsOutcome, HttpMethod};

    fn preflight_args(argv: &[&str]) -> PreflightArgs {
        let mut full = vec!["probe", "preflight"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Some(Commands::Preflight(args)) => args,
            other => panic!("expected preflight command, got {:?}", other),
        }
    }

    fn report(origin: &str, outcome: CorsOutcome, permissive_origin: bool) -> PreflightReport {
        PreflightReport {
            path: "/sessions".to_string(),
            origin: origin.to_string(),
            request_method: HttpMethod::Post,
            status: Some(204),
            allow_origin: permissive_origin.then(|| "*".to_string()),
            allow_methods: None,
            allow_headers: None,
            origin_allowed: permissive_origin,
            method_allowed: true,
            missing_headers: Vec::new(),
            permissive_origin,
            error: None,
            outcome,
        }
    }

    fn rejected() -> CorsOutcome {
        CorsOutcome::Rejected {
            reasons: vec!["origin not allowed".to_string()],
        }
    }

    #[test]
    fn test_matrix_adds_builtin_origins() {
        let plan = OriginPlan::from_args(&preflight_args(&[
            "--origin",
            "https://app.example.com",
            "--matrix",
        ]));

        assert_eq!(plan.checked, vec!["https://app.example.com"]);
        assert_eq!(plan.matrix, DEFAULT_PROBE_ORIGINS);
        assert_eq!(plan.first_origin(), "https://app.example.com");
    }

    #[test]
    fn test_matrix_alone_is_enough() {
        let plan = OriginPlan::from_args(&preflight_args(&["--matrix"]));
        assert!(plan.checked.is_empty());
        assert_eq!(plan.first_origin(), DEFAULT_PROBE_ORIGINS[0]);
    }

    #[test]
    fn test_explicit_origins_are_not_repeated_in_matrix() {
        let plan = OriginPlan::from_args(&preflight_args(&[
            "--origins",
            "http://localhost:3000,https://app.example.com",
            "--matrix",
        ]));

        assert_eq!(plan.checked, vec!["http://localhost:3000", "https://app.example.com"]);
        assert!(!plan.matrix.iter().any(|o| o == "http://localhost:3000"));
        assert_eq!(plan.matrix.len(), DEFAULT_PROBE_ORIGINS.len() - 1);
    }

    #[test]
    fn test_without_matrix_nothing_is_added() {
        let plan = OriginPlan::from_args(&preflight_args(&["--origin", "https://app.example.com"]));
        assert!(plan.matrix.is_empty());
    }

    #[test]
    fn test_rejected_matrix_origins_pass() {
        let checked = vec![report("https://app.example.com", CorsOutcome::Allowed, false)];
        let matrix = vec![report("https://evil.com", rejected(), false)];
        assert!(!has_failures(&checked, &matrix));
    }

    #[test]
    fn test_wildcard_for_matrix_origin_fails() {
        let matrix = vec![report("https://evil.com", CorsOutcome::Allowed, true)];
        assert!(has_failures(&[], &matrix));
    }

    #[test]
    fn test_rejected_checked_origin_fails() {
        let checked = vec![report("https://app.example.com", rejected(), false)];
        assert!(has_failures(&checked, &[]));
    }
}

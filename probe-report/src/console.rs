//! Human-readable console rendering

use crate::model::{CaseStatus, LoadReport, SuiteReport};
use crate::verdict::{Grade, VerdictLabel};
use colored::{ColoredString, Colorize};
use probe_http::{CorsOutcome, PreflightReport};
use std::io::{self, IsTerminal, Write};

/// Renders reports to any writer
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    color: bool,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colour only when enabled, stdout is a terminal and `NO_COLOR` is unset
    pub fn for_stdout(color_enabled: bool) -> Self {
        let color = color_enabled
            && io::stdout().is_terminal()
            && std::env::var_os("NO_COLOR").is_none();
        Self::new(color)
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn label(&self, label: VerdictLabel) -> String {
        match label {
            VerdictLabel::Ready => self.paint(label.as_str(), |s| s.bright_green().bold()),
            VerdictLabel::MostlyReady => self.paint(label.as_str(), |s| s.bright_yellow().bold()),
            VerdictLabel::NotReady => self.paint(label.as_str(), |s| s.bright_red().bold()),
        }
    }

    fn grade(&self, grade: Grade) -> String {
        let text = grade.to_string();
        match grade {
            Grade::Good => self.paint(&text, |s| s.green()),
            Grade::Acceptable => self.paint(&text, |s| s.yellow()),
            Grade::Poor => self.paint(&text, |s| s.red()),
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint(&format!("== {} ==", text), |s| s.bright_cyan().bold())
    }

    pub fn write_load_report<W: Write>(&self, out: &mut W, report: &LoadReport) -> io::Result<()> {
        let stats = &report.stats;

        writeln!(out, "{}", self.heading(&format!("Load report: {}", report.name)))?;
        writeln!(out, "{:<16} {}", "Run:", report.run_id)?;
        writeln!(out, "{:<16} {}", "Mode:", report.mode)?;
        writeln!(out, "{:<16} {:.2}s", "Duration:", report.total_duration / 1000.0)?;
        writeln!(
            out,
            "{:<16} {} total, {} ok, {} failed",
            "Requests:", stats.total_requests, stats.successful, stats.failed
        )?;
        writeln!(out, "{:<16} {}", "Error rate:", percent(stats.error_rate))?;
        writeln!(
            out,
            "{:<16} avg {}  min {}  max {}",
            "Response time:",
            millis(stats.average_response_time),
            millis(stats.min_response_time),
            millis(stats.max_response_time)
        )?;
        match &stats.percentiles {
            Some(p) => writeln!(
                out,
                "{:<16} p50 {:.1}ms  p95 {:.1}ms  p99 {:.1}ms",
                "Percentiles:", p.p50, p.p95, p.p99
            )?,
            None => writeln!(out, "{:<16} n/a", "Percentiles:")?,
        }
        match stats.throughput {
            Some(rps) => writeln!(out, "{:<16} {:.2} req/s", "Throughput:", rps)?,
            None => writeln!(out, "{:<16} n/a", "Throughput:")?,
        }

        if !stats.status_counts.is_empty() {
            let counts: Vec<String> = stats
                .status_counts
                .iter()
                .map(|(key, count)| format!("{} x{}", key, count))
                .collect();
            writeln!(out, "{:<16} {}", "Outcomes:", counts.join(", "))?;
        }

        if stats.endpoints.len() > 1 {
            writeln!(out, "Endpoints:")?;
            for (name, endpoint) in &stats.endpoints {
                writeln!(
                    out,
                    "  {:<24} {} req, {} failed, avg {}",
                    name,
                    endpoint.total,
                    endpoint.failed,
                    millis(endpoint.average_response_time)
                )?;
            }
        }

        writeln!(out, "{:<16} {}", "Verdict:", self.label(report.verdict.label))?;
        for criterion in &report.verdict.criteria {
            writeln!(
                out,
                "  {:<28} {:>10.3}  {}",
                criterion.name,
                criterion.value,
                self.grade(criterion.grade)
            )?;
        }

        Ok(())
    }

    pub fn write_suite_report<W: Write>(&self, out: &mut W, report: &SuiteReport) -> io::Result<()> {
        writeln!(out, "{}", self.heading(&format!("Scenario: {}", report.name)))?;

        for case in &report.cases {
            let status = match case.status {
                CaseStatus::Passed => self.paint("PASSED", |s| s.bright_green().bold()),
                CaseStatus::Failed => self.paint("FAILED", |s| s.bright_red().bold()),
            };
            writeln!(
                out,
                "  {} {}  {} ({:.0}ms)",
                status, case.id, case.description, case.duration
            )?;
            if let Some(error) = &case.error {
                writeln!(out, "      {}", self.paint(error, |s| s.red()))?;
            }
        }

        let summary = format!(
            "Total: {}, passed: {}, failed: {}",
            report.total, report.passed, report.failed
        );
        if report.all_passed() {
            writeln!(out, "{}", self.paint(&summary, |s| s.green()))
        } else {
            writeln!(out, "{}", self.paint(&summary, |s| s.red()))
        }
    }

    pub fn write_preflight_reports<W: Write>(
        &self,
        out: &mut W,
        reports: &[PreflightReport],
    ) -> io::Result<()> {
        for report in reports {
            writeln!(
                out,
                "{}",
                self.heading(&format!(
                    "Preflight {} {} from {}",
                    report.request_method, report.path, report.origin
                ))
            )?;
            let status = report
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "no response".to_string());
            writeln!(out, "{:<16} {}", "Status:", status)?;
            writeln!(out, "{:<16} {}", "Allow-Origin:", or_missing(&report.allow_origin))?;
            writeln!(out, "{:<16} {}", "Allow-Methods:", or_missing(&report.allow_methods))?;
            writeln!(out, "{:<16} {}", "Allow-Headers:", or_missing(&report.allow_headers))?;
            if !report.missing_headers.is_empty() {
                writeln!(
                    out,
                    "{:<16} {}",
                    "Missing headers:",
                    self.paint(&report.missing_headers.join(", "), |s| s.yellow())
                )?;
            }
            if report.permissive_origin {
                writeln!(
                    out,
                    "{}",
                    self.paint("  warning: Access-Control-Allow-Origin is '*'", |s| s.yellow())
                )?;
            }
            match &report.outcome {
                CorsOutcome::Allowed => {
                    writeln!(out, "{:<16} {}", "Outcome:", self.paint("allowed", |s| s.green().bold()))?
                }
                CorsOutcome::Rejected { reasons } => {
                    writeln!(out, "{:<16} {}", "Outcome:", self.paint("rejected", |s| s.red().bold()))?;
                    for reason in reasons {
                        writeln!(out, "  - {}", reason)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn millis(value: Option<f64>) -> String {
    value
        .map(|ms| format!("{:.1}ms", ms))
        .unwrap_or_else(|| "n/a".to_string())
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|rate| format!("{:.2}%", rate * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn or_missing(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(missing)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestCaseResult;
    use chrono::Utc;
    use probe_config::VerdictConfig;
    use probe_http::{HttpMethod, PreflightRequest, RequestResult};
    use probe_load::{AggregateStats, DriverMode, LoadRun};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn load_report(results: Vec<RequestResult>) -> LoadReport {
        let now = Utc::now();
        let stats = AggregateStats::from_results(&results, Some(Duration::from_secs(1)));
        let run = LoadRun {
            name: "sessions".into(),
            mode: DriverMode::Batched {
                batch_size: 10,
                delay: Duration::from_millis(100),
            },
            started_at: now,
            finished_at: now,
            wall_time: Duration::from_secs(1),
            results,
            stats,
        };
        LoadReport::from_run(run, &VerdictConfig::default(), false)
    }

    #[test]
    fn test_load_report_rendering() {
        let results = (0..4)
            .map(|_| {
                RequestResult::from_response(None, 201, BTreeMap::new(), None, Duration::from_millis(80))
            })
            .collect();
        let report = load_report(results);

        let text = render(|out| ConsoleReporter::new(false).write_load_report(out, &report));

        assert!(text.contains("Load report: sessions"));
        assert!(text.contains("4 total, 4 ok, 0 failed"));
        assert!(text.contains("avg 80.0ms"));
        assert!(text.contains("201 x4"));
        assert!(text.contains("READY"));
        assert!(!text.contains('\u{1b}'), "no escape codes without colour");
    }

    #[test]
    fn test_empty_load_report_shows_na() {
        let text = render(|out| ConsoleReporter::new(false).write_load_report(out, &load_report(Vec::new())));
        assert!(text.contains("avg n/a"));
        assert!(text.contains("NOT_READY"));
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_suite_report_rendering() {
        let now = Utc::now();
        let suite = SuiteReport::new(
            "auth",
            now,
            now,
            vec![
                TestCaseResult {
                    id: "public".into(),
                    description: "public access works".into(),
                    status: CaseStatus::Passed,
                    duration: 31.0,
                    error: None,
                    steps: Vec::new(),
                },
                TestCaseResult {
                    id: "expired".into(),
                    description: "expired token is refused".into(),
                    status: CaseStatus::Failed,
                    duration: 12.0,
                    error: Some("expected status 401, got 200".into()),
                    steps: Vec::new(),
                },
            ],
        );

        let text = render(|out| ConsoleReporter::new(false).write_suite_report(out, &suite));

        assert!(text.contains("PASSED public  public access works (31ms)"));
        assert!(text.contains("FAILED expired"));
        assert!(text.contains("expected status 401, got 200"));
        assert!(text.contains("Total: 2, passed: 1, failed: 1"));
    }

    #[test]
    fn test_preflight_rendering() {
        let request = PreflightRequest::new("/sessions", "https://app.test", HttpMethod::Post)
            .with_headers(["x-public-access"]);
        let mut headers = BTreeMap::new();
        headers.insert("access-control-allow-origin".to_string(), "*".to_string());
        headers.insert("access-control-allow-headers".to_string(), "content-type".to_string());
        let result = RequestResult::from_response(None, 204, headers, None, Duration::ZERO);
        let report = probe_http::evaluate_preflight(&request, &result);

        let text = render(|out| ConsoleReporter::new(false).write_preflight_reports(out, &[report]));

        assert!(text.contains("Missing headers: x-public-access"));
        assert!(text.contains("Allow-Methods:   (missing)"));
        assert!(text.contains("warning: Access-Control-Allow-Origin is '*'"));
        assert!(text.contains("rejected"));
    }
}

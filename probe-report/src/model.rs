//! Serializable report documents

use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use probe_config::VerdictConfig;
use probe_http::{HttpMethod, RequestResult};
use probe_load::{AggregateStats, DriverMode, LoadRun};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Everything known about a finished load run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub run_id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Wall time in milliseconds
    pub total_duration: f64,
    pub mode: DriverMode,
    pub stats: AggregateStats,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RequestResult>>,
}

impl LoadReport {
    pub fn from_run(run: LoadRun, thresholds: &VerdictConfig, include_results: bool) -> Self {
        let verdict = Verdict::evaluate(&run.stats, thresholds);
        Self {
            run_id: Uuid::new_v4(),
            name: run.name,
            started_at: run.started_at,
            finished_at: run.finished_at,
            total_duration: run.wall_time.as_secs_f64() * 1000.0,
            mode: run.mode,
            stats: run.stats,
            verdict,
            results: include_results.then_some(run.results),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    Passed,
    Failed,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CaseStatus::Passed => "PASSED",
            CaseStatus::Failed => "FAILED",
        })
    }
}

/// One executed step of a test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub name: String,
    pub method: HttpMethod,
    /// Path after template rendering
    pub path: String,
    pub status: Option<u16>,
    /// Milliseconds of the last attempt
    pub response_time: f64,
    /// Requests issued, retries and polls included
    pub attempts: u32,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub id: String,
    pub description: String,
    pub status: CaseStatus,
    /// Milliseconds
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
}

impl TestCaseResult {
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Outcome of a whole scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cases: Vec<TestCaseResult>,
}

impl SuiteReport {
    pub fn new(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        cases: Vec<TestCaseResult>,
    ) -> Self {
        let passed = cases.iter().filter(|c| c.passed()).count();
        Self {
            run_id: Uuid::new_v4(),
            name: name.into(),
            started_at,
            finished_at,
            total: cases.len(),
            passed,
            failed: cases.len() - passed,
            cases,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn case(id: &str, status: CaseStatus) -> TestCaseResult {
        TestCaseResult {
            id: id.to_string(),
            description: format!("case {}", id),
            status,
            duration: 12.0,
            error: (status == CaseStatus::Failed).then(|| "expected status 201, got 500".to_string()),
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_suite_totals() {
        let now = Utc::now();
        let suite = SuiteReport::new(
            "sessions",
            now,
            now,
            vec![
                case("a", CaseStatus::Passed),
                case("b", CaseStatus::Failed),
                case("c", CaseStatus::Passed),
            ],
        );
        assert_eq!(suite.total, 3);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
        assert!(!suite.all_passed());
    }

    #[test]
    fn test_case_json_shape() {
        let value = serde_json::to_value(case("b", CaseStatus::Failed)).unwrap();
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["error"], "expected status 201, got 500");
    }

    #[test]
    fn test_load_report_from_run() {
        let now = Utc::now();
        let run = LoadRun {
            name: "smoke".into(),
            mode: DriverMode::Parallel,
            started_at: now,
            finished_at: now,
            wall_time: Duration::from_millis(1500),
            results: Vec::new(),
            stats: AggregateStats::default(),
        };
        let report = LoadReport::from_run(run, &VerdictConfig::default(), false);
        assert_eq!(report.total_duration, 1500.0);
        assert!(report.results.is_none());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["verdict"]["label"], "NOT_READY");
        assert_eq!(value["mode"]["type"], "parallel");
        assert!(value.get("runId").is_some());
    }
}

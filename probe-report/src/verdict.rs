//! Qualitative readiness verdict

use probe_config::VerdictConfig;
use probe_load::AggregateStats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grade of a single criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Good,
    Acceptable,
    Poor,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grade::Good => "good",
            Grade::Acceptable => "acceptable",
            Grade::Poor => "poor",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictLabel {
    Ready,
    MostlyReady,
    NotReady,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Ready => "READY",
            VerdictLabel::MostlyReady => "MOSTLY_READY",
            VerdictLabel::NotReady => "NOT_READY",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One graded measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub value: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: VerdictLabel,
    pub criteria: Vec<Criterion>,
}

impl Verdict {
    /// Grade `stats` against the thresholds.
    ///
    /// READY when every criterion is good, NOT_READY when any is poor or
    /// there is nothing to grade, MOSTLY_READY otherwise.
    pub fn evaluate(stats: &AggregateStats, thresholds: &VerdictConfig) -> Self {
        let mut criteria = Vec::new();

        if let Some(average) = stats.average_response_time {
            criteria.push(Criterion {
                name: "average response time (ms)".to_string(),
                value: average,
                grade: grade_at_most(average, thresholds.avg_good_ms, thresholds.avg_acceptable_ms),
            });
        }

        if let Some(error_rate) = stats.error_rate {
            criteria.push(Criterion {
                name: "error rate".to_string(),
                value: error_rate,
                grade: grade_at_most(
                    error_rate,
                    thresholds.error_rate_good,
                    thresholds.error_rate_acceptable,
                ),
            });
        }

        if let Some(minimum) = thresholds.min_throughput {
            // A configured floor with no measurable throughput is poor
            let throughput = stats.throughput.unwrap_or(0.0);
            let grade = if throughput >= minimum {
                Grade::Good
            } else if throughput >= minimum / 2.0 {
                Grade::Acceptable
            } else {
                Grade::Poor
            };
            criteria.push(Criterion {
                name: "throughput (req/s)".to_string(),
                value: throughput,
                grade,
            });
        }

        let label = if stats.is_empty() || criteria.iter().any(|c| c.grade == Grade::Poor) {
            VerdictLabel::NotReady
        } else if criteria.iter().all(|c| c.grade == Grade::Good) {
            VerdictLabel::Ready
        } else {
            VerdictLabel::MostlyReady
        };

        Self { label, criteria }
    }

    pub fn is_ready(&self) -> bool {
        self.label == VerdictLabel::Ready
    }
}

fn grade_at_most(value: f64, good: f64, acceptable: f64) -> Grade {
    if value <= good {
        Grade::Good
    } else if value <= acceptable {
        Grade::Acceptable
    } else {
        Grade::Poor
    }
}

//! Statistics over a set of request results
//!
//! Every derived value is `None` when it is undefined (no samples, zero wall
//! time), so reports never show NaN or infinity.

use probe_http::RequestResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Value at quantile `p` of an ascending sample: index `floor(n * p)`,
/// clamped to the last element
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let index = ((sorted.len() as f64) * p).floor() as usize;
    sorted.get(index.min(sorted.len() - 1)).copied()
}

/// Response time percentiles in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    /// Percentiles of an ascending sample; `None` when empty
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        Some(Self {
            p50: percentile(sorted, 0.50)?,
            p95: percentile(sorted, 0.95)?,
            p99: percentile(sorted, 0.99)?,
        })
    }
}

/// Per-endpoint slice of the aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub average_response_time: Option<f64>,
    pub error_rate: Option<f64>,
}

/// Aggregate view of a run. Response times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub average_response_time: Option<f64>,
    #[serde(rename = "min")]
    pub min_response_time: Option<f64>,
    #[serde(rename = "max")]
    pub max_response_time: Option<f64>,
    pub percentiles: Option<Percentiles>,
    /// Requests per second of wall time
    pub throughput: Option<f64>,
    /// `failed / total`, between 0 and 1
    pub error_rate: Option<f64>,
    /// Status code, or failure kind when no response arrived, to count
    pub status_counts: BTreeMap<String, u64>,
    pub endpoints: BTreeMap<String, EndpointStats>,
}

impl AggregateStats {
    /// Fold `results`; `wall_time` is the run's elapsed time, used for
    /// throughput
    pub fn from_results(results: &[RequestResult], wall_time: Option<Duration>) -> Self {
        let total = results.len() as u64;
        if total == 0 {
            return Self::default();
        }

        let successful = results.iter().filter(|r| r.success).count() as u64;
        let failed = total - successful;

        let mut times: Vec<f64> = results.iter().map(RequestResult::response_time_ms).collect();
        times.sort_by(f64::total_cmp);

        let mut status_counts = BTreeMap::new();
        for result in results {
            *status_counts.entry(result.outcome_key()).or_insert(0) += 1;
        }

        let throughput = wall_time
            .map(|wall| wall.as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .map(|secs| total as f64 / secs);

        Self {
            total_requests: total,
            successful,
            failed,
            average_response_time: mean(&times),
            min_response_time: times.first().copied(),
            max_response_time: times.last().copied(),
            percentiles: Percentiles::from_sorted(&times),
            throughput,
            error_rate: Some(failed as f64 / total as f64),
            status_counts,
            endpoints: endpoint_breakdown(results),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_requests == 0
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn endpoint_breakdown(results: &[RequestResult]) -> BTreeMap<String, EndpointStats> {
    let mut grouped: BTreeMap<String, (EndpointStats, f64)> = BTreeMap::new();

    for result in results {
        let name = result.name.clone().unwrap_or_else(|| "unnamed".to_string());
        let (stats, time_sum) = grouped.entry(name).or_default();
        stats.total += 1;
        if result.success {
            stats.successful += 1;
        } else {
            stats.failed += 1;
        }
        *time_sum += result.response_time_ms();
    }

    grouped
        .into_iter()
        .map(|(name, (mut stats, time_sum))| {
            let total = stats.total as f64;
            stats.average_response_time = Some(time_sum / total);
            stats.error_rate = Some(stats.failed as f64 / total);
            (name, stats)
        })
        .collect()
}

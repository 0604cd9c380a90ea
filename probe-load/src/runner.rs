//! Load runs built from configuration

use crate::driver::{ConcurrencyDriver, DriverMode};
use crate::error::{LoadError, LoadResult};
use crate::stats::AggregateStats;
use chrono::{DateTime, Utc};
use probe_config::{EndpointConfig, LoadConfig};
use probe_http::{HttpMethod, RequestExecutor, RequestResult, RequestSpec};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// What to send and how
#[derive(Debug, Clone, PartialEq)]
pub struct LoadPlan {
    pub name: String,
    /// Total requests, spread round-robin over `endpoints`
    pub requests: usize,
    pub mode: DriverMode,
    pub endpoints: Vec<RequestSpec>,
}

impl LoadPlan {
    pub fn new(name: impl Into<String>, requests: usize, mode: DriverMode) -> Self {
        Self {
            name: name.into(),
            requests,
            mode,
            endpoints: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: RequestSpec) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn from_config(config: &LoadConfig) -> LoadResult<Self> {
        let endpoints = config
            .endpoints
            .iter()
            .map(endpoint_request)
            .collect::<LoadResult<Vec<_>>>()?;

        Ok(Self {
            name: config.name.clone(),
            requests: config.requests,
            mode: DriverMode::from(&config.mode),
            endpoints,
        })
    }

    /// One descriptor per request, cycling through the endpoints
    pub fn descriptors(&self) -> LoadResult<Vec<RequestSpec>> {
        if self.endpoints.is_empty() {
            return Err(LoadError::NoEndpoints);
        }
        Ok(self
            .endpoints
            .iter()
            .cycle()
            .take(self.requests)
            .cloned()
            .collect())
    }
}

fn endpoint_request(endpoint: &EndpointConfig) -> LoadResult<RequestSpec> {
    let method: HttpMethod = endpoint
        .method
        .parse()
        .map_err(|source| LoadError::InvalidMethod {
            endpoint: endpoint.name.clone(),
            source,
        })?;

    let mut request = RequestSpec::new(method, endpoint.path.clone()).named(endpoint.name.clone());
    request.headers = endpoint.headers.clone();
    request.body = endpoint.body.clone();
    Ok(request)
}

/// A finished load run
#[derive(Debug, Clone, Serialize)]
pub struct LoadRun {
    pub name: String,
    pub mode: DriverMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip)]
    pub wall_time: Duration,
    pub results: Vec<RequestResult>,
    pub stats: AggregateStats,
}

/// Drives a [`LoadPlan`] and aggregates what came back
pub struct LoadRunner<E> {
    executor: E,
}

impl<E: RequestExecutor> LoadRunner<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn run(&self, plan: &LoadPlan) -> LoadResult<LoadRun> {
        let descriptors = plan.descriptors()?;
        let driver = ConcurrencyDriver::new(&self.executor, plan.mode);

        info!(
            "Starting load run '{}': {} request(s) over {} endpoint(s)",
            plan.name,
            descriptors.len(),
            plan.endpoints.len()
        );

        let started_at = Utc::now();
        let start = Instant::now();
        let results = driver.run(&descriptors).await;
        let wall_time = start.elapsed();
        let finished_at = Utc::now();

        let stats = AggregateStats::from_results(&results, Some(wall_time));
        info!(
            "Load run '{}' finished in {:.2}s: {} ok, {} failed",
            plan.name,
            wall_time.as_secs_f64(),
            stats.successful,
            stats.failed
        );

        Ok(LoadRun {
            name: plan.name.clone(),
            mode: plan.mode,
            started_at,
            finished_at,
            wall_time,
            results,
            stats,
        })
    }
}

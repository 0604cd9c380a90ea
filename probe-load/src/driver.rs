//! Fan-out/fan-in of request descriptors over an executor

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use probe_config::LoadModeConfig;
use probe_http::{RequestExecutor, RequestResult, RequestSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// How the driver schedules requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverMode {
    /// Every request in flight at once
    Parallel,

    /// Sequential batches, each fully parallel, `delay` between batches
    Batched {
        batch_size: usize,
        #[serde(with = "probe_config::serde_duration_ms", rename = "delay_ms")]
        delay: Duration,
    },

    /// Sliding window of at most `concurrency` in-flight requests
    Bounded { concurrency: usize },
}

impl From<&LoadModeConfig> for DriverMode {
    fn from(config: &LoadModeConfig) -> Self {
        match config {
            LoadModeConfig::Parallel => DriverMode::Parallel,
            LoadModeConfig::Batched { batch_size, delay } => DriverMode::Batched {
                batch_size: *batch_size,
                delay: *delay,
            },
            LoadModeConfig::Bounded { concurrency } => DriverMode::Bounded {
                concurrency: *concurrency,
            },
        }
    }
}

impl fmt::Display for DriverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverMode::Parallel => write!(f, "parallel"),
            DriverMode::Batched { batch_size, delay } => {
                write!(f, "batched (size {}, delay {}ms)", batch_size, delay.as_millis())
            }
            DriverMode::Bounded { concurrency } => write!(f, "bounded (concurrency {})", concurrency),
        }
    }
}

/// Issues exactly one call per descriptor and returns results in descriptor
/// order. Batch size and concurrency of zero are treated as one.
pub struct ConcurrencyDriver<E> {
    executor: E,
    mode: DriverMode,
}

impl<E: RequestExecutor> ConcurrencyDriver<E> {
    pub fn new(executor: E, mode: DriverMode) -> Self {
        Self { executor, mode }
    }

    pub fn mode(&self) -> DriverMode {
        self.mode
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub async fn run(&self, requests: &[RequestSpec]) -> Vec<RequestResult> {
        info!("Driving {} request(s) in {} mode", requests.len(), self.mode);

        match self.mode {
            DriverMode::Parallel => self.run_parallel(requests).await,
            DriverMode::Batched { batch_size, delay } => {
                self.run_batched(requests, batch_size.max(1), delay).await
            }
            DriverMode::Bounded { concurrency } => {
                self.run_bounded(requests, concurrency.max(1)).await
            }
        }
    }

    async fn run_parallel(&self, requests: &[RequestSpec]) -> Vec<RequestResult> {
        join_all(requests.iter().map(|request| self.executor.execute(request))).await
    }

    async fn run_batched(
        &self,
        requests: &[RequestSpec],
        batch_size: usize,
        delay: Duration,
    ) -> Vec<RequestResult> {
        let batches = requests.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(requests.len());

        for (index, batch) in requests.chunks(batch_size).enumerate() {
            if index > 0 && !delay.is_zero() {
                sleep(delay).await;
            }

            let batch_results = self.run_parallel(batch).await;
            debug!(
                "Batch {}/{}: {} of {} succeeded",
                index + 1,
                batches,
                batch_results.iter().filter(|r| r.success).count(),
                batch_results.len()
            );
            results.extend(batch_results);
        }

        results
    }

    async fn run_bounded(&self, requests: &[RequestSpec], concurrency: usize) -> Vec<RequestResult> {
        stream::iter(requests.iter().map(|request| self.executor.execute(request)))
            .buffered(concurrency)
            .collect()
            .await
    }
}

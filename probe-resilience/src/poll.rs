//! Predicate-based polling
//!
//! Re-runs a probe at a fixed interval until its output satisfies a
//! predicate or the attempt budget runs out. Used wherever a run needs to wait
//! for the target to reach some state instead of sleeping a fixed time.

use log::debug;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How often and how long to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Total probe invocations allowed
    pub max_attempts: u32,

    /// Pause between two invocations
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(500),
        }
    }
}

/// Result of a polling loop
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome<T> {
    /// Last value produced by the probe
    pub value: T,

    /// Number of probe invocations
    pub attempts: u32,

    /// Whether the predicate held for `value`
    pub satisfied: bool,
}

/// Poll `probe` until `predicate` accepts its output.
///
/// The probe always runs at least once, even with `max_attempts == 0`.
pub async fn poll_until<F, Fut, T, P>(policy: PollPolicy, mut probe: F, predicate: P) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let value = probe(attempt).await;

        if predicate(&value) {
            debug!("Poll condition met after {} attempt(s)", attempt);
            return PollOutcome {
                value,
                attempts: attempt,
                satisfied: true,
            };
        }

        if attempt >= max_attempts {
            debug!("Poll condition not met after {} attempt(s)", attempt);
            return PollOutcome {
                value,
                attempts: attempt,
                satisfied: false,
            };
        }

        sleep(policy.interval).await;
        attempt += 1;
    }
}

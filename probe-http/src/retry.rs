//! Retrying wrapper around a [`RequestExecutor`]

use crate::client::RequestExecutor;
use crate::types::{FailureKind, RequestResult, RequestSpec};
use async_trait::async_trait;
use probe_resilience::{RetryExecutor, RetryPolicy, Retryable};
use std::fmt;
use tracing::debug;

/// Whether a failed result is worth another attempt: transport failures,
/// 5xx and 429. Other 4xx and invalid requests are final.
pub fn is_retryable_result(result: &RequestResult) -> bool {
    if result.success {
        return false;
    }
    match (result.failure, result.status) {
        (Some(FailureKind::InvalidRequest), _) => false,
        (Some(kind), None) if kind.is_transport() => true,
        (_, Some(status)) => status >= 500 || status == 429,
        _ => false,
    }
}

/// A failed attempt carried through the retry loop
#[derive(Debug)]
struct FailedAttempt(RequestResult);

impl Retryable for FailedAttempt {
    fn is_retryable(&self) -> bool {
        is_retryable_result(&self.0)
    }
}

impl fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.0.status, &self.0.error) {
            (Some(status), _) => write!(f, "HTTP {}", status),
            (None, Some(error)) => f.write_str(error),
            (None, None) => f.write_str("request failed"),
        }
    }
}

/// Executor that re-issues failed requests according to a [`RetryPolicy`].
///
/// Still never fails: when attempts run out, the last attempt's result is
/// returned.
pub struct RetryingExecutor<E> {
    inner: E,
    retry: RetryExecutor,
}

impl<E: RequestExecutor> RetryingExecutor<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self {
            inner,
            retry: RetryExecutor::new(policy),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.retry.policy()
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: RequestExecutor> RequestExecutor for RetryingExecutor<E> {
    async fn execute(&self, request: &RequestSpec) -> RequestResult {
        let inner = &self.inner;
        let outcome = self
            .retry
            .execute(move || async move {
                let result = inner.execute(request).await;
                if result.success {
                    Ok(result)
                } else {
                    Err(FailedAttempt(result))
                }
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(error) => {
                debug!(
                    "{} gave up after {} attempt(s)",
                    request.label(),
                    error.attempts()
                );
                error.into_inner().0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpExecutor;
    use crate::HttpConfig;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Replays a fixed sequence of statuses, then the last one forever
    struct ScriptedExecutor {
        statuses: Vec<Option<u16>>,
        calls: AtomicU32,
    }

    impl ScriptedExecutor {
        fn new(statuses: Vec<Option<u16>>) -> Self {
            Self {
                statuses,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl RequestExecutor for ScriptedExecutor {
        async fn execute(&self, _request: &RequestSpec) -> RequestResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let status = self.statuses[call.min(self.statuses.len() - 1)];
            match status {
                Some(code) => {
                    RequestResult::from_response(None, code, BTreeMap::new(), None, Duration::ZERO)
                }
                None => RequestResult::failed(
                    None,
                    FailureKind::Connect,
                    "connection refused",
                    Duration::ZERO,
                ),
            }
        }
    }

    #[test]
    fn test_retryable_classification() {
        let status = |code| RequestResult::from_response(None, code, BTreeMap::new(), None, Duration::ZERO);
        assert!(is_retryable_result(&status(500)));
        assert!(is_retryable_result(&status(503)));
        assert!(is_retryable_result(&status(429)));
        assert!(!is_retryable_result(&status(400)));
        assert!(!is_retryable_result(&status(401)));
        assert!(!is_retryable_result(&status(200)));
        assert!(is_retryable_result(&RequestResult::failed(
            None,
            FailureKind::Timeout,
            "timed out",
            Duration::ZERO
        )));
        assert!(!is_retryable_result(&RequestResult::failed(
            None,
            FailureKind::InvalidRequest,
            "bad header",
            Duration::ZERO
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transport_failures_until_success() {
        let executor = RetryingExecutor::new(
            ScriptedExecutor::new(vec![None, Some(502), Some(201)]),
            RetryPolicy::linear(3, Duration::from_millis(100)),
        );
        let start = tokio::time::Instant::now();

        let result = executor.execute(&RequestSpec::get("/sessions")).await;

        assert!(result.success);
        assert_eq!(result.status, Some(201));
        assert_eq!(executor.inner().calls.load(Ordering::SeqCst), 3);
        // linear: 100ms then 200ms
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        let executor = RetryingExecutor::new(
            ScriptedExecutor::new(vec![Some(401)]),
            RetryPolicy::linear(5, Duration::from_millis(100)),
        );

        let result = executor.execute(&RequestSpec::get("/analytics/usage")).await;

        assert_eq!(result.status, Some(401));
        assert_eq!(executor.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_attempts_return_last_result() {
        let executor = RetryingExecutor::new(
            ScriptedExecutor::new(vec![None]),
            RetryPolicy::linear(3, Duration::from_millis(10)),
        );

        let result = executor.execute(&RequestSpec::get("/health")).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("connection refused"));
        assert_eq!(executor.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_against_flaky_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let http = HttpExecutor::new(server.uri(), HttpConfig::default()).unwrap();
        let executor = RetryingExecutor::new(http, RetryPolicy::linear(3, Duration::from_millis(10)));

        let result = executor.execute(&RequestSpec::get("/health")).await;
        assert!(result.success);
        assert_eq!(result.status, Some(200));
    }
}

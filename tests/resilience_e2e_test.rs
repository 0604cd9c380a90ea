//! Transport failures and retries seen through the public executor API

use anyhow::Result;
use probe_config::ProbeConfig;
use probe_http::{
    FailureKind, HttpConfig, HttpExecutor, RequestExecutor, RequestSpec, RetryingExecutor,
};
use probe_load::{DriverMode, LoadPlan, LoadRunner};
use probe_resilience::RetryPolicy;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn closed_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[tokio::test]
async fn test_connection_refused_is_a_result_not_an_error() -> Result<()> {
    let base_url = format!("http://127.0.0.1:{}", closed_port()?);
    let executor = HttpExecutor::new(base_url, HttpConfig::default())?;

    let result = executor.execute(&RequestSpec::get("/health")).await;

    assert!(!result.success);
    assert_eq!(result.status, None);
    assert_eq!(result.failure, Some(FailureKind::Connect));
    assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_load_run_against_dead_target_completes() -> Result<()> {
    let mut config = ProbeConfig::default();
    config.target.base_url = format!("http://127.0.0.1:{}", closed_port()?);

    let plan = LoadPlan::new("dead target", 6, DriverMode::Bounded { concurrency: 2 })
        .with_endpoint(RequestSpec::get("/health").named("health"));
    let run = LoadRunner::new(HttpExecutor::from_config(&config)?)
        .run(&plan)
        .await?;

    assert_eq!(run.results.len(), 6);
    assert_eq!(run.stats.failed, 6);
    assert_eq!(run.stats.error_rate, Some(1.0));
    assert!(run.results.iter().all(|r| r.error.is_some()));
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_retried() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analytics/usage"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analytics/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"uploads": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let executor = RetryingExecutor::new(
        HttpExecutor::new(server.uri(), HttpConfig::default())?,
        RetryPolicy::linear(3, Duration::from_millis(10)),
    );
    let result = executor.execute(&RequestSpec::get("/analytics/usage")).await;

    assert!(result.success);
    assert_eq!(result.data, Some(serde_json::json!({"uploads": 3})));
    Ok(())
}

#[tokio::test]
async fn test_client_errors_are_not_retried() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/analytics/usage"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let executor = RetryingExecutor::new(
        HttpExecutor::new(server.uri(), HttpConfig::default())?,
        RetryPolicy::linear(5, Duration::from_millis(10)),
    );
    let result = executor.execute(&RequestSpec::get("/analytics/usage")).await;

    assert!(!result.success);
    assert_eq!(result.status, Some(401));
    assert_eq!(result.failure, Some(FailureKind::HttpStatus));
    Ok(())
}

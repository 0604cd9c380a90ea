//! Load runs against a mock server

use probe_http::{HttpConfig, HttpExecutor, RequestSpec};
use probe_load::{DriverMode, LoadPlan, LoadRunner};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_batched_run_issues_exactly_n_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sessionId": "s-1"})))
        .expect(12)
        .mount(&server)
        .await;

    let executor = HttpExecutor::new(server.uri(), HttpConfig::default()).unwrap();
    let plan = LoadPlan::new(
        "session burst",
        12,
        DriverMode::Batched {
            batch_size: 5,
            delay: Duration::from_millis(20),
        },
    )
    .with_endpoint(RequestSpec::post("/sessions", json!({"studentName": "load"})).named("create"));

    let run = LoadRunner::new(executor).run(&plan).await.unwrap();

    assert_eq!(run.results.len(), 12);
    assert_eq!(run.stats.total_requests, 12);
    assert_eq!(run.stats.successful, 12);
    assert_eq!(run.stats.error_rate, Some(0.0));
    assert_eq!(run.stats.status_counts.get("201"), Some(&12));
    // two gaps between three batches
    assert!(run.wall_time >= Duration::from_millis(40));
    assert!(run.finished_at >= run.started_at);
}

#[tokio::test]
async fn test_mixed_endpoints_breakdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analytics/usage"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let executor = HttpExecutor::new(server.uri(), HttpConfig::default()).unwrap();
    let plan = LoadPlan::new("mixed", 10, DriverMode::Bounded { concurrency: 3 })
        .with_endpoint(RequestSpec::get("/health").named("health"))
        .with_endpoint(RequestSpec::get("/analytics/usage").named("usage"));

    let run = LoadRunner::new(executor).run(&plan).await.unwrap();

    assert_eq!(run.stats.failed, 5);
    assert_eq!(run.stats.endpoints["health"].successful, 5);
    assert_eq!(run.stats.endpoints["usage"].failed, 5);
    assert_eq!(run.stats.endpoints["usage"].error_rate, Some(1.0));
    assert!(run.stats.throughput.is_some());
}

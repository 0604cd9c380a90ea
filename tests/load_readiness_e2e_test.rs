//! Configured load runs graded and written to disk

use anyhow::Result;
use probe_config::{ConfigLoader, ProbeConfig};
use probe_http::HttpExecutor;
use probe_load::{LoadPlan, LoadRunner};
use probe_report::{load_report_path, write_load_report, LoadReport, VerdictLabel};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_config(base_url: &str, requests: usize) -> Result<ProbeConfig> {
    let yaml = format!(
        r#"
target:
  base_url: {base_url}
  auth:
    mode: public_access
load:
  name: Upload readiness
  requests: {requests}
  mode:
    type: batched
    batch_size: 4
    delay_ms: 10
  endpoints:
    - name: recent uploads
      path: /uploads/recent
    - name: create session
      method: POST
      path: /sessions
      body:
        studentName: load
verdict:
  avg_good_ms: 1000
  avg_acceptable_ms: 3000
  error_rate_good: 0.01
  error_rate_acceptable: 0.05
"#
    );
    let dir = TempDir::new()?;
    let file = dir.path().join("probe.yaml");
    fs::write(&file, yaml)?;
    Ok(ConfigLoader::new().from_file(&file)?)
}

#[tokio::test]
async fn test_healthy_target_is_ready_and_reported() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads/recent"))
        .and(header("x-public-access", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sessionId": "s-1"})))
        .expect(5)
        .mount(&server)
        .await;

    let config = load_config(&server.uri(), 10)?;
    let plan = LoadPlan::from_config(&config.load)?;
    let run = LoadRunner::new(HttpExecutor::from_config(&config)?)
        .run(&plan)
        .await?;

    let report = LoadReport::from_run(run, &config.verdict, true);
    assert_eq!(report.verdict.label, VerdictLabel::Ready);
    assert_eq!(report.stats.total_requests, 10);
    assert_eq!(report.stats.endpoints.len(), 2);

    let dir = TempDir::new()?;
    let written = write_load_report(dir.path(), &report)?;
    assert_eq!(written, load_report_path(dir.path(), "Upload readiness"));

    let json: Value = serde_json::from_str(&fs::read_to_string(&written)?)?;
    assert_eq!(json["name"], "Upload readiness");
    assert_eq!(json["verdict"]["label"], "READY");
    assert_eq!(json["stats"]["totalRequests"], 10);
    assert_eq!(json["results"].as_array().map(Vec::len), Some(10));
    assert!(json["stats"]["averageResponseTime"].is_number());

    Ok(())
}

#[tokio::test]
async fn test_failing_target_is_not_ready() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uploads/recent"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sessionId": "s-1"})))
        .mount(&server)
        .await;

    let config = load_config(&server.uri(), 8)?;
    let plan = LoadPlan::from_config(&config.load)?;
    let run = LoadRunner::new(HttpExecutor::from_config(&config)?)
        .run(&plan)
        .await?;
    let report = LoadReport::from_run(run, &config.verdict, false);

    assert_eq!(report.stats.failed, 4);
    assert_eq!(report.stats.error_rate, Some(0.5));
    assert_eq!(report.stats.status_counts.get("503"), Some(&4));
    assert_eq!(report.verdict.label, VerdictLabel::NotReady);
    assert!(report.results.is_none());

    Ok(())
}

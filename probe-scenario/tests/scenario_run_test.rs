//! Scenario files executed against a mock API

use probe_config::ProbeConfig;
use probe_scenario::{executor_for, Scenario, ScenarioRunner};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scenario_for(server: &MockServer) -> Scenario {
    let yaml = format!(
        r#"
name: Upload flow
base_url: {}
auth:
  mode: public_access
variables:
  fileName: lecture.mp4
cases:
  - id: session-upload
    description: a created session id is used for the upload URL
    steps:
      - name: create session
        request:
          method: POST
          path: /sessions
          body:
            studentName: Ada
        expect:
          status: 201
        capture:
          sessionId: /sessionId
      - name: request upload URL
        request:
          method: POST
          path: /sessions/{{{{sessionId}}}}/upload
          body:
            fileName: "{{{{fileName}}}}"
            sessionId: "{{{{sessionId}}}}"
        expect:
          status: [200, 201]
          body:
            exists: [/uploadUrl]
  - id: analytics-requires-token
    description: analytics is closed to public access
    steps:
      - request:
          path: /analytics/usage
        expect:
          status: 401
          success: false
"#,
        server.uri()
    );
    Scenario::from_yaml_str(&yaml).unwrap()
}

#[tokio::test]
async fn test_scenario_against_mock_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(header("x-public-access", "true"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sessionId": "abc-123"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sessions/abc-123/upload"))
        .and(body_json(json!({"fileName": "lecture.mp4", "sessionId": "abc-123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uploadUrl": "https://bucket/signed"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/analytics/usage"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .mount(&server)
        .await;

    let scenario = scenario_for(&server);
    let executor = executor_for(&scenario, &ProbeConfig::default()).unwrap();
    let report = ScenarioRunner::new(executor).run(&scenario).await;

    assert_eq!(report.total, 2);
    assert!(report.all_passed(), "{:#?}", report.cases);
    assert_eq!(report.cases[0].steps[1].path, "/sessions/abc-123/upload");
}

#[tokio::test]
async fn test_unreachable_api_fails_cases_without_panicking() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let yaml = format!(
        "name: down\nbase_url: http://127.0.0.1:{}\ncases:\n  - id: health\n    steps:\n      - request: {{path: /health}}\n",
        port
    );
    let scenario = Scenario::from_yaml_str(&yaml).unwrap();
    let executor = executor_for(&scenario, &ProbeConfig::default()).unwrap();

    let report = ScenarioRunner::new(executor).run(&scenario).await;

    assert_eq!(report.failed, 1);
    let step = &report.cases[0].steps[0];
    assert_eq!(step.status, None);
    assert!(!step.failures.is_empty());
}

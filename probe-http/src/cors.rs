//! CORS preflight probing
//!
//! Issues the `OPTIONS` request a browser would send before a cross-origin
//! call and decides whether the browser would go on to make the real request.

use crate::client::RequestExecutor;
use crate::types::{HttpMethod, RequestResult, RequestSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const ALLOW_ORIGIN: &str = "access-control-allow-origin";
const ALLOW_METHODS: &str = "access-control-allow-methods";
const ALLOW_HEADERS: &str = "access-control-allow-headers";

/// Request headers a browser never lists in a preflight
const SAFELISTED_HEADERS: &[&str] = &["accept", "accept-language", "content-language"];

/// Origins probed by the origin matrix when none are given
pub const DEFAULT_PROBE_ORIGINS: &[&str] = &["https://evil.com", "http://localhost:3000", "null"];

/// The cross-origin request being checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightRequest {
    pub path: String,
    pub origin: String,
    pub request_method: HttpMethod,
    #[serde(default)]
    pub request_headers: Vec<String>,
}

impl PreflightRequest {
    pub fn new(path: impl Into<String>, origin: impl Into<String>, request_method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            origin: origin.into(),
            request_method,
            request_headers: Vec::new(),
        }
    }

    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request_headers
            .extend(headers.into_iter().map(|h| h.into().trim().to_ascii_lowercase()));
        self
    }

    /// Same request from another origin
    pub fn for_origin(&self, origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..self.clone()
        }
    }

    /// The `OPTIONS` request a browser sends: no credentials, no custom headers
    pub fn to_request(&self) -> RequestSpec {
        let mut spec = RequestSpec::new(HttpMethod::Options, self.path.clone())
            .named(format!("preflight {}", self.path))
            .with_header("origin", self.origin.clone())
            .with_header("access-control-request-method", self.request_method.as_str())
            .without_defaults();
        if !self.request_headers.is_empty() {
            spec = spec.with_header(
                "access-control-request-headers",
                self.request_headers.join(","),
            );
        }
        spec
    }
}

/// Whether the browser would perform the real request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CorsOutcome {
    Allowed,
    Rejected { reasons: Vec<String> },
}

/// What a preflight revealed about the API's CORS policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightReport {
    pub path: String,
    pub origin: String,
    pub request_method: HttpMethod,
    pub status: Option<u16>,
    pub allow_origin: Option<String>,
    pub allow_methods: Option<String>,
    pub allow_headers: Option<String>,
    pub origin_allowed: bool,
    pub method_allowed: bool,
    /// Requested headers absent from `Access-Control-Allow-Headers`
    pub missing_headers: Vec<String>,
    /// `Access-Control-Allow-Origin: *`
    pub permissive_origin: bool,
    pub error: Option<String>,
    pub outcome: CorsOutcome,
}

impl PreflightReport {
    pub fn is_allowed(&self) -> bool {
        self.outcome == CorsOutcome::Allowed
    }
}

/// Issue the preflight for `request` and evaluate the response
pub async fn preflight<E>(executor: &E, request: &PreflightRequest) -> PreflightReport
where
    E: RequestExecutor + ?Sized,
{
    debug!(
        "Preflight {} from {} for {}",
        request.path, request.origin, request.request_method
    );
    let result = executor.execute(&request.to_request()).await;
    evaluate(request, &result)
}

/// Probe the same request from each origin in turn
pub async fn origin_matrix<E, S>(
    executor: &E,
    request: &PreflightRequest,
    origins: &[S],
) -> Vec<PreflightReport>
where
    E: RequestExecutor + ?Sized,
    S: AsRef<str>,
{
    let mut reports = Vec::with_capacity(origins.len());
    for origin in origins {
        let report = preflight(executor, &request.for_origin(origin.as_ref())).await;
        info!(
            "Origin {} -> {}",
            report.origin,
            if report.origin_allowed { "allowed" } else { "not allowed" }
        );
        reports.push(report);
    }
    reports
}

/// Judge a preflight response the way a browser would
pub fn evaluate(request: &PreflightRequest, result: &RequestResult) -> PreflightReport {
    let allow_origin = result.header(ALLOW_ORIGIN).map(|v| v.trim().to_string());
    let allow_methods = result.header(ALLOW_METHODS).map(str::to_string);
    let allow_headers = result.header(ALLOW_HEADERS).map(str::to_string);

    let mut report = PreflightReport {
        path: request.path.clone(),
        origin: request.origin.clone(),
        request_method: request.request_method,
        status: result.status,
        permissive_origin: allow_origin.as_deref() == Some("*"),
        origin_allowed: false,
        method_allowed: false,
        missing_headers: Vec::new(),
        allow_origin,
        allow_methods,
        allow_headers,
        error: result.error.clone(),
        outcome: CorsOutcome::Allowed,
    };

    let Some(status) = result.status else {
        // No response at all: the browser sees status 0
        report.missing_headers = request.request_headers.clone();
        report.outcome = CorsOutcome::Rejected {
            reasons: vec![format!(
                "preflight failed: {}",
                result.error.as_deref().unwrap_or("no response")
            )],
        };
        return report;
    };

    report.origin_allowed = matches!(
        report.allow_origin.as_deref(),
        Some(value) if value == "*" || value == request.origin
    );
    report.method_allowed = method_allowed(request.request_method, report.allow_methods.as_deref());
    report.missing_headers = missing_headers(&request.request_headers, report.allow_headers.as_deref());

    let mut reasons = Vec::new();
    if status != 200 && status != 204 {
        reasons.push(format!("preflight returned status {}", status));
    }
    if !report.origin_allowed {
        reasons.push(match &report.allow_origin {
            Some(value) => format!("origin {} not allowed (allowed: {})", request.origin, value),
            None => format!("origin {} not allowed (no Access-Control-Allow-Origin)", request.origin),
        });
    }
    if !report.method_allowed {
        reasons.push(format!("method {} not allowed", request.request_method));
    }
    if !report.missing_headers.is_empty() {
        reasons.push(format!(
            "headers not allowed: {}",
            report.missing_headers.join(", ")
        ));
    }

    if !reasons.is_empty() {
        report.outcome = CorsOutcome::Rejected { reasons };
    }
    report
}

fn tokens(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
}

fn method_allowed(method: HttpMethod, allow_methods: Option<&str>) -> bool {
    match allow_methods {
        None => method.is_cors_safelisted(),
        Some(list) => {
            let wanted = method.as_str().to_ascii_lowercase();
            method.is_cors_safelisted() || tokens(list).any(|m| m == "*" || m == wanted)
        }
    }
}

fn missing_headers(requested: &[String], allow_headers: Option<&str>) -> Vec<String> {
    let allowed: Vec<String> = allow_headers.map(|list| tokens(list).collect()).unwrap_or_default();
    if allowed.iter().any(|h| h == "*") {
        return Vec::new();
    }

    requested
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .filter(|h| !SAFELISTED_HEADERS.contains(&h.as_str()) && !allowed.contains(h))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpExecutor;
    use crate::HttpConfig;
    use crate::types::FailureKind;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response(status: u16, headers: &[(&str, &str)]) -> RequestResult {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RequestResult::from_response(None, status, headers, None, Duration::ZERO)
    }

    fn upload_request() -> PreflightRequest {
        PreflightRequest::new("/sessions", "https://app.test", HttpMethod::Post)
            .with_headers(["Content-Type", "X-Public-Access"])
    }

    #[test]
    fn test_allowed_preflight() {
        let report = evaluate(
            &upload_request(),
            &response(
                204,
                &[
                    ("access-control-allow-origin", "https://app.test"),
                    ("access-control-allow-methods", "GET, POST, OPTIONS"),
                    ("access-control-allow-headers", "Content-Type, X-Public-Access"),
                ],
            ),
        );
        assert!(report.is_allowed());
        assert!(report.origin_allowed);
        assert!(report.method_allowed);
        assert!(report.missing_headers.is_empty());
        assert!(!report.permissive_origin);
    }

    #[test]
    fn test_missing_header_is_reported() {
        let report = evaluate(
            &upload_request(),
            &response(
                200,
                &[
                    ("access-control-allow-origin", "https://app.test"),
                    ("access-control-allow-methods", "POST"),
                    ("access-control-allow-headers", "content-type"),
                ],
            ),
        );
        assert_eq!(report.missing_headers, vec!["x-public-access".to_string()]);
        assert!(matches!(report.outcome, CorsOutcome::Rejected { .. }));
    }

    #[test]
    fn test_wildcards_allow_everything_but_are_flagged() {
        let report = evaluate(
            &upload_request().for_origin("https://evil.com"),
            &response(
                204,
                &[
                    ("access-control-allow-origin", "*"),
                    ("access-control-allow-methods", "*"),
                    ("access-control-allow-headers", "*"),
                ],
            ),
        );
        assert!(report.is_allowed());
        assert!(report.permissive_origin);
    }

    #[test]
    fn test_non_2xx_preflight_is_rejected() {
        let report = evaluate(
            &upload_request(),
            &response(403, &[("access-control-allow-origin", "https://app.test")]),
        );
        let CorsOutcome::Rejected { reasons } = report.outcome else {
            panic!("expected rejection");
        };
        assert!(reasons.iter().any(|r| r.contains("status 403")));
    }

    #[test]
    fn test_method_without_allow_methods_header() {
        let get = PreflightRequest::new("/health", "https://app.test", HttpMethod::Get);
        let delete = PreflightRequest::new("/sessions/1", "https://app.test", HttpMethod::Delete);
        let result = response(204, &[("access-control-allow-origin", "https://app.test")]);

        assert!(evaluate(&get, &result).method_allowed);
        assert!(!evaluate(&delete, &result).method_allowed);
    }

    #[test]
    fn test_transport_failure_is_rejected() {
        let result = RequestResult::failed(
            None,
            FailureKind::Connect,
            "connection refused",
            Duration::ZERO,
        );
        let report = evaluate(&upload_request(), &result);
        assert!(!report.is_allowed());
        assert_eq!(report.status, None);
        assert_eq!(report.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_preflight_request_shape() {
        let spec = upload_request().to_request();
        assert_eq!(spec.method, HttpMethod::Options);
        assert!(!spec.apply_defaults);
        assert_eq!(
            spec.headers.get("access-control-request-headers").map(String::as_str),
            Some("content-type,x-public-access")
        );
    }

    #[tokio::test]
    async fn test_preflight_against_server_missing_public_access() {
        let server = MockServer::start().await;
        Mock::given(method("OPTIONS"))
            .and(path("/sessions"))
            .and(header("origin", "https://app.test"))
            .and(header("access-control-request-method", "POST"))
            .respond_with(
                ResponseTemplate::new(204)
                    .insert_header("Access-Control-Allow-Origin", "https://app.test")
                    .insert_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
                    .insert_header("Access-Control-Allow-Headers", "Content-Type, Authorization"),
            )
            .mount(&server)
            .await;

        let executor = HttpExecutor::new(server.uri(), HttpConfig::default()).unwrap();
        let report = preflight(&executor, &upload_request()).await;

        assert_eq!(report.status, Some(204));
        assert!(report.origin_allowed);
        assert_eq!(report.missing_headers, vec!["x-public-access".to_string()]);
        assert!(!report.is_allowed());
    }

    #[tokio::test]
    async fn test_origin_matrix_echoing_server() {
        let server = MockServer::start().await;
        Mock::given(method("OPTIONS"))
            .and(header("origin", "http://localhost:3000"))
            .respond_with(
                ResponseTemplate::new(204)
                    .insert_header("Access-Control-Allow-Origin", "http://localhost:3000"),
            )
            .mount(&server)
            .await;
        Mock::given(method("OPTIONS"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let executor = HttpExecutor::new(server.uri(), HttpConfig::default()).unwrap();
        let base = PreflightRequest::new("/health", "https://app.test", HttpMethod::Get);
        let reports = origin_matrix(&executor, &base, DEFAULT_PROBE_ORIGINS).await;

        assert_eq!(reports.len(), 3);
        let allowed: Vec<&str> = reports
            .iter()
            .filter(|r| r.origin_allowed)
            .map(|r| r.origin.as_str())
            .collect();
        assert_eq!(allowed, vec!["http://localhost:3000"]);
    }
}

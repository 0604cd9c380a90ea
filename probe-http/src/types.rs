//! Request descriptors, results and HTTP methods

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// HTTP methods accepted by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Methods a browser may send cross-origin without listing them in
    /// `Access-Control-Allow-Methods`
    pub fn is_cors_safelisted(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HttpMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(HttpMethodError::InvalidMethod(s.to_string())),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Errors that can occur when parsing HTTP methods
#[derive(Error, Debug, Clone)]
pub enum HttpMethodError {
    #[error("Invalid HTTP method: '{0}'. Supported methods are: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS")]
    InvalidMethod(String),
}

/// One HTTP call to make against the target
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Label used for per-endpoint statistics; defaults to `METHOD path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub method: HttpMethod,

    /// Relative to the executor's base URL, or an absolute `http(s)://` URL
    pub path: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonValue>,

    /// When false, the executor's default and auth headers are not sent
    #[serde(default = "default_apply_defaults", skip_serializing)]
    pub apply_defaults: bool,
}

fn default_apply_defaults() -> bool {
    true
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: None,
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            apply_defaults: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, body: JsonValue) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Send only the headers set on this request
    pub fn without_defaults(mut self) -> Self {
        self.apply_defaults = false;
        self
    }

    /// Label reported in results
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }
}

/// Why a request did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request timed out before a full response was read
    Timeout,
    /// DNS failure or connection refused/reset while connecting
    Connect,
    /// Any other failure below HTTP
    Transport,
    /// A response arrived with a non-2xx status
    HttpStatus,
    /// The request could not be built (bad URL, header or method)
    InvalidRequest,
}

impl FailureKind {
    /// Failures where no response was received
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FailureKind::Timeout | FailureKind::Connect | FailureKind::Transport
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connect => "connect",
            FailureKind::Transport => "transport",
            FailureKind::HttpStatus => "http_status",
            FailureKind::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single HTTP call.
///
/// `success` is true iff a response with a 2xx status was received. When it is
/// false, either `status` holds the HTTP status or `error` explains the
/// transport failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub success: bool,

    pub status: Option<u16>,

    /// Wall time of the call, body read included
    #[serde(with = "duration_millis")]
    pub response_time: Duration,

    pub data: Option<JsonValue>,

    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    /// Response headers, names lower-cased
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl RequestResult {
    /// Result for a call that produced an HTTP response
    pub fn from_response(
        name: Option<String>,
        status: u16,
        headers: BTreeMap<String, String>,
        data: Option<JsonValue>,
        response_time: Duration,
    ) -> Self {
        let success = (200..300).contains(&status);
        Self {
            name,
            success,
            status: Some(status),
            response_time,
            data,
            error: None,
            failure: (!success).then_some(FailureKind::HttpStatus),
            headers,
        }
    }

    /// Result for a call that never produced a response
    pub fn failed(
        name: Option<String>,
        failure: FailureKind,
        error: impl Into<String>,
        response_time: Duration,
    ) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = failure.to_string();
        }
        Self {
            name,
            success: false,
            status: None,
            response_time,
            data: None,
            error: Some(error),
            failure: Some(failure),
            headers: BTreeMap::new(),
        }
    }

    pub fn response_time_ms(&self) -> f64 {
        duration_millis::as_millis_f64(self.response_time)
    }

    /// Case-insensitive response header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Status code, or failure kind when no response arrived
    pub fn outcome_key(&self) -> String {
        match (self.status, self.failure) {
            (Some(status), _) => status.to_string(),
            (None, Some(kind)) => kind.to_string(),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// Serializes a `Duration` as fractional milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(as_millis_f64(*duration))
    }

    pub fn as_millis_f64(duration: Duration) -> f64 {
        duration.as_nanos() as f64 / 1_000_000.0
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom("responseTime must be a non-negative number"));
        }
        Ok(Duration::from_nanos((millis * 1_000_000.0).round() as u64))
    }
}

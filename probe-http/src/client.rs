//! HTTP client implementation

use crate::errors::HttpError;
use crate::types::{FailureKind, RequestResult, RequestSpec};
use async_trait::async_trait;
use probe_config::{AuthMode, HttpConfig, ProbeConfig};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Executes one request and reports what happened.
///
/// Implementations never fail: every outcome, including transport errors,
/// is expressed as a [`RequestResult`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &RequestSpec) -> RequestResult;
}

#[async_trait]
impl<T: RequestExecutor + ?Sized> RequestExecutor for &T {
    async fn execute(&self, request: &RequestSpec) -> RequestResult {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: RequestExecutor + ?Sized> RequestExecutor for Arc<T> {
    async fn execute(&self, request: &RequestSpec) -> RequestResult {
        (**self).execute(request).await
    }
}

/// Header carrying the credentials for an auth mode, if any
pub fn auth_header(mode: AuthMode, token: Option<&str>) -> Option<(&'static str, String)> {
    match (mode, token) {
        (AuthMode::None, _) => None,
        (AuthMode::PublicAccess, _) => Some(("x-public-access", "true".to_string())),
        (AuthMode::Token, Some(token)) => Some(("x-auth-token", token.to_string())),
        (AuthMode::Bearer, Some(token)) => Some(("authorization", format!("Bearer {}", token))),
        (AuthMode::Token | AuthMode::Bearer, None) => {
            warn!("Auth mode '{}' configured without a token; no auth header sent", mode);
            None
        }
    }
}

/// [`RequestExecutor`] backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    base_url: String,
    default_headers: BTreeMap<String, String>,
    config: HttpConfig,
}

impl HttpExecutor {
    /// Create an executor issuing relative paths against `base_url`
    pub fn new(base_url: impl Into<String>, config: HttpConfig) -> Result<Self, HttpError> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| HttpError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        debug!(
            "Creating HttpExecutor for {} with timeout: {}s",
            base_url,
            config.timeout.as_secs_f64()
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(redirect_policy(config.max_redirects))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            default_headers: BTreeMap::new(),
            config,
        })
    }

    /// Create an executor from the target and http configuration domains
    pub fn from_config(config: &ProbeConfig) -> Result<Self, HttpError> {
        let mut executor = Self::new(&config.target.base_url, config.http.clone())?;
        for (name, value) in &config.target.default_headers {
            executor = executor.with_default_header(name, value);
        }
        Ok(executor.with_auth(config.target.auth.mode, config.target.auth.token.as_deref()))
    }

    /// Add a header sent with every request
    pub fn with_default_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.default_headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Send credentials for `mode` with every request
    pub fn with_auth(self, mode: AuthMode, token: Option<&str>) -> Self {
        match auth_header(mode, token) {
            Some((name, value)) => self.with_default_header(name, value),
            None => self,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Time allowed for a whole request, body read included
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    /// Join `path` to the base URL with exactly one `/` in between.
    /// Absolute `http(s)://` paths are used as they are.
    pub fn resolve_url(&self, path: &str) -> Result<Url, HttpError> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.is_empty() {
            self.base_url.clone()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };

        Url::parse(&raw).map_err(|e| HttpError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    fn build_headers(&self, request: &RequestSpec) -> Result<HeaderMap, HttpError> {
        let mut headers = HeaderMap::new();

        let defaults = request
            .apply_defaults
            .then_some(&self.default_headers)
            .into_iter()
            .flatten();

        // Request headers come last so they replace defaults of the same name
        for (name, value) in defaults.chain(request.headers.iter()) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HttpError::InvalidHeaderName(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeaderValue(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        if request.body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }

    async fn send(&self, request: &RequestSpec) -> Result<HttpResponse, HttpError> {
        let url = self.resolve_url(&request.path)?;
        let headers = self.build_headers(request)?;

        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(headers);

        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());

        // Read once; fall back to a string when the body is not JSON
        let bytes = response.bytes().await?;
        let data = parse_body(&bytes);

        Ok(HttpResponse {
            status,
            headers,
            data,
        })
    }
}

struct HttpResponse {
    status: u16,
    headers: BTreeMap<String, String>,
    data: Option<JsonValue>,
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: &RequestSpec) -> RequestResult {
        let start = Instant::now();
        let outcome = self.send(request).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(response) => {
                debug!(
                    "{} {} -> {} in {:.1}ms",
                    request.method,
                    request.path,
                    response.status,
                    elapsed.as_secs_f64() * 1000.0
                );
                RequestResult::from_response(
                    request.name.clone(),
                    response.status,
                    response.headers,
                    response.data,
                    elapsed,
                )
            }
            Err(error) => {
                let kind = classify(&error);
                let message = error_message(&error);
                warn!(
                    "{} {} failed ({}): {}",
                    request.method, request.path, kind, message
                );
                RequestResult::failed(request.name.clone(), kind, message, elapsed)
            }
        }
    }
}

fn redirect_policy(max_redirects: u32) -> reqwest::redirect::Policy {
    match max_redirects {
        0 => reqwest::redirect::Policy::none(),
        n => reqwest::redirect::Policy::limited(n as usize),
    }
}

fn classify(error: &HttpError) -> FailureKind {
    match error {
        HttpError::NetworkError(e) if e.is_timeout() => FailureKind::Timeout,
        HttpError::NetworkError(e) if e.is_connect() => FailureKind::Connect,
        HttpError::NetworkError(e) if e.is_builder() => FailureKind::InvalidRequest,
        HttpError::NetworkError(_) => FailureKind::Transport,
        _ => FailureKind::InvalidRequest,
    }
}

/// Error text including its source chain, e.g. the OS "connection refused"
fn error_message(error: &HttpError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

fn parse_body(bytes: &[u8]) -> Option<JsonValue> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(JsonValue::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
    }
}

//! HTTP request execution for the probe harness
//!
//! Every call goes through a [`RequestExecutor`], which never fails: transport
//! errors and HTTP error statuses are folded into the same [`RequestResult`]
//! shape as a successful call.

pub mod client;
pub mod cors;
pub mod errors;
pub mod retry;
pub mod types;

// Re-export main types for convenience
pub use client::{auth_header, HttpExecutor, RequestExecutor};
pub use probe_config::HttpConfig;
pub use cors::{
    evaluate as evaluate_preflight, origin_matrix, preflight, CorsOutcome, PreflightReport,
    PreflightRequest, DEFAULT_PROBE_ORIGINS,
};
pub use errors::HttpError;
pub use retry::{is_retryable_result, RetryingExecutor};
pub use types::{FailureKind, HttpMethod, HttpMethodError, RequestResult, RequestSpec};

//! Load plan errors

use probe_http::HttpMethodError;
use thiserror::Error;

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Load plan has no endpoints")]
    NoEndpoints,

    #[error("Endpoint '{endpoint}': {source}")]
    InvalidMethod {
        endpoint: String,
        #[source]
        source: HttpMethodError,
    },
}

//! Synthetic load generation for the probe harness
//!
//! The [`ConcurrencyDriver`] fans request descriptors out over an executor,
//! [`AggregateStats`] folds the results, and [`LoadRunner`] ties both to a
//! [`LoadPlan`] built from configuration.

pub mod driver;
pub mod error;
pub mod runner;
pub mod stats;

pub use driver::{ConcurrencyDriver, DriverMode};
pub use error::{LoadError, LoadResult};
pub use runner::{LoadPlan, LoadRun, LoadRunner};
pub use stats::{percentile, AggregateStats, EndpointStats, Percentiles};

//! Logging initialisation for the probe harness
//!
//! Installs a global `tracing` subscriber with an `EnvFilter`, a console
//! layer on stderr and an optional daily-rolling log file. Records from the
//! `log` facade are forwarded to the same subscriber.

pub mod error;
pub mod init;

pub use error::LoggingError;
pub use init::{build_filter, init_logging, LoggingGuard};

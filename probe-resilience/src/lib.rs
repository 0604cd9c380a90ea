//! Resilience patterns for the probe harness
//!
//! This crate provides retry policies with configurable backoff and
//! predicate-based polling used in place of fixed sleeps.

pub mod backoff;
pub mod poll;
pub mod retry;

// Re-export commonly used types
pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use poll::{poll_until, PollOutcome, PollPolicy};
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};

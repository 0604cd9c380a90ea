//! Reporting for load runs, scenario suites and CORS probes
//!
//! Reports are plain serializable structs. [`ConsoleReporter`] renders them
//! for humans, the [`json`] module writes them to disk.

pub mod console;
pub mod error;
pub mod json;
pub mod model;
pub mod verdict;

pub use console::ConsoleReporter;
pub use error::{ReportError, ReportResult};
pub use json::{load_report_path, slugify, suite_report_path, write_load_report, write_suite_report};
pub use model::{CaseStatus, LoadReport, StepResult, SuiteReport, TestCaseResult};
pub use verdict::{Criterion, Grade, Verdict, VerdictLabel};

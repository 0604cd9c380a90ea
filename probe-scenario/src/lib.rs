//! Declarative scenario runner
//!
//! A scenario file lists test cases, each a sequence of HTTP steps with
//! expectations. Values captured from one response feed later requests
//! through `{{variable}}` templates.

pub mod error;
pub mod expect;
pub mod model;
pub mod runner;
pub mod template;

pub use error::{ScenarioError, ScenarioResult};
pub use expect::{BodyExpectations, Expectation, HeaderExpectations, StatusExpectation};
pub use model::{Scenario, Step, StepRetry, TestCase, WaitUntil};
pub use runner::{executor_for, ScenarioRunner};
pub use template::TemplateEngine;

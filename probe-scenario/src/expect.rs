//! Assertions on a request result

use crate::error::ScenarioResult;
use crate::template::TemplateEngine;
use probe_http::RequestResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Either one accepted status or a set of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusExpectation {
    One(u16),
    AnyOf(Vec<u16>),
}

impl StatusExpectation {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusExpectation::One(expected) => *expected == status,
            StatusExpectation::AnyOf(expected) => expected.contains(&status),
        }
    }

    fn describe(&self) -> String {
        match self {
            StatusExpectation::One(expected) => expected.to_string(),
            StatusExpectation::AnyOf(expected) => {
                let codes: Vec<String> = expected.iter().map(u16::to_string).collect();
                format!("one of [{}]", codes.join(", "))
            }
        }
    }
}

/// Header checks; names are case-insensitive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderExpectations {
    pub present: Vec<String>,
    pub absent: Vec<String>,
    /// Exact value match
    pub equals: BTreeMap<String, String>,
    /// The header, read as a comma-separated list, contains this token
    pub contains: BTreeMap<String, String>,
}

/// Body checks keyed by JSON pointer (`/sessionId`, `/items/0/id`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyExpectations {
    pub exists: Vec<String>,
    pub equals: BTreeMap<String, Value>,
}

/// What a step's response must look like
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expectation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusExpectation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub headers: HeaderExpectations,
    pub body: BodyExpectations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_ms: Option<u64>,
}

impl Expectation {
    /// Applied to steps without an `expect` block
    pub fn succeeds() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }

    /// Render templates inside expected header and body values
    pub fn render(&self, engine: &TemplateEngine, variables: &Value) -> ScenarioResult<Self> {
        let mut rendered = self.clone();
        for value in rendered.headers.equals.values_mut() {
            *value = engine.render(value, variables)?;
        }
        for value in rendered.headers.contains.values_mut() {
            *value = engine.render(value, variables)?;
        }
        for value in rendered.body.equals.values_mut() {
            *value = engine.render_value(value, variables)?;
        }
        Ok(rendered)
    }

    /// Every unmet expectation, described; empty when the result passes
    pub fn check(&self, result: &RequestResult) -> Vec<String> {
        let mut failures = Vec::new();

        if let Some(expected) = &self.status {
            match result.status {
                Some(status) if expected.accepts(status) => {}
                Some(status) => failures.push(format!(
                    "expected status {}, got {}",
                    expected.describe(),
                    status
                )),
                None => failures.push(format!(
                    "expected status {}, got no response ({})",
                    expected.describe(),
                    result.error.as_deref().unwrap_or("unknown error")
                )),
            }
        }

        if let Some(expected) = self.success {
            if result.success != expected {
                let outcome = match (result.status, &result.error) {
                    (Some(status), _) => format!("status {}", status),
                    (None, Some(error)) => error.clone(),
                    (None, None) => "no response".to_string(),
                };
                failures.push(format!(
                    "expected success={}, got success={} ({})",
                    expected, result.success, outcome
                ));
            }
        }

        self.check_headers(result, &mut failures);
        self.check_body(result, &mut failures);

        if let Some(limit) = self.max_response_ms {
            let elapsed = result.response_time_ms();
            if elapsed > limit as f64 {
                failures.push(format!(
                    "response took {:.1}ms, limit {}ms",
                    elapsed, limit
                ));
            }
        }

        failures
    }

    fn check_headers(&self, result: &RequestResult, failures: &mut Vec<String>) {
        for name in &self.headers.present {
            if result.header(name).is_none() {
                failures.push(format!("expected header {} to be present", name));
            }
        }

        for name in &self.headers.absent {
            if let Some(value) = result.header(name) {
                failures.push(format!("expected header {} to be absent, got '{}'", name, value));
            }
        }

        for (name, expected) in &self.headers.equals {
            match result.header(name) {
                Some(actual) if actual.trim() == expected => {}
                Some(actual) => failures.push(format!(
                    "expected header {} = '{}', got '{}'",
                    name, expected, actual
                )),
                None => failures.push(format!("expected header {} = '{}', header missing", name, expected)),
            }
        }

        for (name, token) in &self.headers.contains {
            let found = result.header(name).is_some_and(|value| {
                value
                    .split(',')
                    .any(|item| item.trim().eq_ignore_ascii_case(token.trim()))
            });
            if !found {
                failures.push(format!(
                    "expected header {} to list '{}', got '{}'",
                    name,
                    token,
                    result.header(name).unwrap_or("(missing)")
                ));
            }
        }
    }

    fn check_body(&self, result: &RequestResult, failures: &mut Vec<String>) {
        let body = result.data.as_ref().unwrap_or(&Value::Null);

        for pointer in &self.body.exists {
            if body.pointer(&normalize_pointer(pointer)).is_none() {
                failures.push(format!("expected body field {} to exist", pointer));
            }
        }

        for (pointer, expected) in &self.body.equals {
            match body.pointer(&normalize_pointer(pointer)) {
                Some(actual) if actual == expected => {}
                Some(actual) => failures.push(format!(
                    "expected body {} = {}, got {}",
                    pointer, expected, actual
                )),
                None => failures.push(format!(
                    "expected body {} = {}, field missing",
                    pointer, expected
                )),
            }
        }
    }
}

/// Accept `sessionId` as shorthand for `/sessionId`
pub fn normalize_pointer(pointer: &str) -> String {
    if pointer.is_empty() || pointer.starts_with('/') {
        pointer.to_string()
    } else {
        format!("/{}", pointer)
    }
}

//! Scenario execution

use crate::error::ScenarioResult;
use crate::expect::normalize_pointer;
use crate::model::{Scenario, Step, TestCase};
use crate::template::TemplateEngine;
use async_trait::async_trait;
use chrono::Utc;
use probe_config::ProbeConfig;
use probe_http::{HttpExecutor, RequestExecutor, RequestResult, RequestSpec, RetryingExecutor};
use probe_report::{CaseStatus, StepResult, SuiteReport, TestCaseResult};
use probe_resilience::poll_until;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Executor for a scenario: the configured target, with the scenario's own
/// base URL, auth and headers taking precedence
pub fn executor_for(scenario: &Scenario, config: &ProbeConfig) -> ScenarioResult<HttpExecutor> {
    let mut effective = config.clone();
    if let Some(base_url) = &scenario.base_url {
        effective.target.base_url = base_url.clone();
    }
    if let Some(auth) = &scenario.auth {
        effective.target.auth = auth.clone();
    }
    effective
        .target
        .default_headers
        .extend(scenario.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

    Ok(HttpExecutor::from_config(&effective)?)
}

/// Counts the requests a step issues through retries and polling
struct CountingExecutor<'a, E> {
    inner: &'a E,
    calls: AtomicU32,
}

#[async_trait]
impl<'a, E: RequestExecutor> RequestExecutor for CountingExecutor<'a, E> {
    async fn execute(&self, request: &RequestSpec) -> RequestResult {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.execute(request).await
    }
}

/// Runs scenario cases in order. Variables captured by any step are visible
/// to every later step, across cases.
pub struct ScenarioRunner<E> {
    executor: E,
    templates: TemplateEngine,
}

impl<E: RequestExecutor> ScenarioRunner<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            templates: TemplateEngine::new(),
        }
    }

    pub async fn run(&self, scenario: &Scenario) -> SuiteReport {
        info!(
            "Running scenario '{}' ({} case(s))",
            scenario.name,
            scenario.cases.len()
        );

        let started_at = Utc::now();
        let mut variables = Value::Object(scenario.variables.clone());
        let mut cases = Vec::with_capacity(scenario.cases.len());

        for case in &scenario.cases {
            let result = self.run_case(case, &mut variables).await;
            match &result.error {
                None => info!("Case {} PASSED in {:.0}ms", case.id, result.duration),
                Some(error) => warn!("Case {} FAILED: {}", case.id, error),
            }
            cases.push(result);
        }

        SuiteReport::new(scenario.name.clone(), started_at, Utc::now(), cases)
    }

    /// Run the steps of one case, stopping at the first failing step
    pub async fn run_case(&self, case: &TestCase, variables: &mut Value) -> TestCaseResult {
        let start = Instant::now();
        let mut steps = Vec::with_capacity(case.steps.len());
        let mut error = None;

        for (index, step) in case.steps.iter().enumerate() {
            let result = self.run_step(step, variables).await;
            let passed = result.passed;
            if !passed {
                error = Some(format!(
                    "step {} ({}): {}",
                    index + 1,
                    result.name,
                    result.failures.join("; ")
                ));
                let skipped = case.steps.len() - index - 1;
                if skipped > 0 {
                    debug!("Skipping {} remaining step(s) of case {}", skipped, case.id);
                }
            }
            steps.push(result);
            if !passed {
                break;
            }
        }

        TestCaseResult {
            id: case.id.clone(),
            description: case.description.clone(),
            status: if error.is_none() {
                CaseStatus::Passed
            } else {
                CaseStatus::Failed
            },
            duration: start.elapsed().as_secs_f64() * 1000.0,
            error,
            steps,
        }
    }

    async fn run_step(&self, step: &Step, variables: &mut Value) -> StepResult {
        let name = step.label();

        let prepared = self
            .templates
            .render_request(&step.request, variables)
            .and_then(|request| {
                let expectation = step.expectation().render(&self.templates, variables)?;
                Ok((request, expectation))
            });
        let (request, expectation) = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                return StepResult {
                    name,
                    method: step.request.method,
                    path: step.request.path.clone(),
                    status: None,
                    response_time: 0.0,
                    attempts: 0,
                    passed: false,
                    failures: vec![error.to_string()],
                };
            }
        };

        let counter = CountingExecutor {
            inner: &self.executor,
            calls: AtomicU32::new(0),
        };

        let result = match step.wait_until {
            Some(wait) => {
                let outcome = poll_until(
                    wait.into(),
                    |_| issue(&counter, step, &request),
                    |result: &RequestResult| expectation.check(result).is_empty(),
                )
                .await;
                debug!(
                    "{}: condition {} after {} poll(s)",
                    name,
                    if outcome.satisfied { "met" } else { "not met" },
                    outcome.attempts
                );
                outcome.value
            }
            None => issue(&counter, step, &request).await,
        };

        let mut failures = expectation.check(&result);
        if failures.is_empty() {
            capture(step, &result, variables, &mut failures);
        }

        debug!(
            "{} {} -> {} ({} failure(s))",
            request.method,
            request.path,
            result.outcome_key(),
            failures.len()
        );

        StepResult {
            name,
            method: request.method,
            path: request.path,
            status: result.status,
            response_time: result.response_time_ms(),
            attempts: counter.calls.load(Ordering::Relaxed),
            passed: failures.is_empty(),
            failures,
        }
    }
}

async fn issue<E: RequestExecutor>(executor: &E, step: &Step, request: &RequestSpec) -> RequestResult {
    match step.retry {
        Some(retry) => {
            RetryingExecutor::new(executor, retry.into())
                .execute(request)
                .await
        }
        None => executor.execute(request).await,
    }
}

/// Resolves every capture of a step; the suite variables change only when all
/// of them resolved
fn capture(step: &Step, result: &RequestResult, variables: &mut Value, failures: &mut Vec<String>) {
    let body = result.data.as_ref().unwrap_or(&Value::Null);
    let mut captured = serde_json::Map::new();

    for (name, pointer) in &step.capture {
        match body.pointer(&normalize_pointer(pointer)) {
            Some(value) => {
                debug!("Captured {} = {}", name, value);
                captured.insert(name.clone(), value.clone());
            }
            None => failures.push(format!(
                "capture {}: {} not found in response body",
                name, pointer
            )),
        }
    }

    if !failures.is_empty() {
        return;
    }
    if let Value::Object(map) = variables {
        map.extend(captured);
    }
}

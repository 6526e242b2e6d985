//! Workflow pipeline
//!
//! A [`Workflow`] is an ordered list of [`Step`]s run one after another
//! against a shared [`WorkflowContext`]. A step builds its request from the
//! context, so a value captured from one response (a created booking's id)
//! reaches later requests explicitly. When a step needs a value that no
//! earlier step captured, it is reported as skipped and never sent.
//! Expectations may be derived from the context the same way, so a step can
//! compare its response with what an earlier response returned.

use std::collections::BTreeMap;
use std::time::Instant;

use apiprobe_domain::report::{ScenarioReport, StepReport, StepStatus};
use apiprobe_domain::request::RequestSpec;
use apiprobe_domain::response::ResponseSpec;
use apiprobe_domain::testing::{Assertion, AssertionResult, TestSuite};
use apiprobe_domain::DomainError;
use thiserror::Error;
use tracing::{info, warn};

use crate::execute_request::ExecuteRequest;
use crate::ports::{HttpClient, ResponseVerifier};

/// Errors raised while building a step's request or capturing from its response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// A value the step depends on was never captured.
    #[error("no '{key}' was captured by an earlier step")]
    MissingValue {
        /// Context key that was missing.
        key: String,
    },

    /// A value could not be read from a response.
    #[error("could not capture '{key}': {reason}")]
    Capture {
        /// Context key being captured.
        key: String,
        /// Why extraction failed.
        reason: String,
    },

    /// A domain value was invalid.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Values captured by earlier steps, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowContext {
    values: BTreeMap<String, String>,
}

impl WorkflowContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any earlier one under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns a value if it was captured.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns a value a step cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingValue`] if nothing was captured under `key`.
    pub fn require(&self, key: &str) -> Result<&str, WorkflowError> {
        self.get(key).ok_or_else(|| WorkflowError::MissingValue {
            key: key.to_string(),
        })
    }
}

type BuildFn = dyn Fn(&WorkflowContext) -> Result<RequestSpec, WorkflowError> + Send + Sync;
type ExtractFn = dyn Fn(&ResponseSpec) -> Result<String, WorkflowError> + Send + Sync;
type ExpectFn = dyn Fn(&WorkflowContext) -> Result<Vec<Assertion>, WorkflowError> + Send + Sync;

/// Reads one value from a response into the context.
pub struct Capture {
    key: String,
    source: String,
    extract: Box<ExtractFn>,
}

impl Capture {
    /// Creates a capture storing the extracted value under `key`.
    ///
    /// `source` names where the value comes from (e.g. `$.bookingid`) and
    /// labels the failed check when extraction fails.
    pub fn new<F>(key: impl Into<String>, source: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&ResponseSpec) -> Result<String, WorkflowError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            source: source.into(),
            extract: Box::new(extract),
        }
    }

    /// Context key the value is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("key", &self.key)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// One request of a workflow with its expectations and captures.
pub struct Step {
    name: String,
    build: Box<BuildFn>,
    suite: TestSuite,
    derived: Vec<Box<ExpectFn>>,
    captures: Vec<Capture>,
}

impl Step {
    /// Creates a step whose request is built from the context.
    pub fn new<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&WorkflowContext) -> Result<RequestSpec, WorkflowError> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            suite: TestSuite::new(name.clone()),
            name,
            build: Box::new(build),
            derived: Vec::new(),
            captures: Vec::new(),
        }
    }

    /// Creates a step that always sends the same request.
    #[must_use]
    pub fn fixed(request: RequestSpec) -> Self {
        let name = request.name.clone();
        Self::new(name, move |_| Ok(request.clone()))
    }

    /// Adds an expectation.
    #[must_use]
    pub fn expect(mut self, assertion: Assertion) -> Self {
        self.suite.add(assertion);
        self
    }

    /// Adds several expectations.
    #[must_use]
    pub fn expect_all(mut self, assertions: impl IntoIterator<Item = Assertion>) -> Self {
        self.suite.assertions.extend(assertions);
        self
    }

    /// Adds expectations built from the context when the step runs.
    ///
    /// A missing context value skips the step, as it does for the request.
    #[must_use]
    pub fn expect_derived<F>(mut self, derive: F) -> Self
    where
        F: Fn(&WorkflowContext) -> Result<Vec<Assertion>, WorkflowError> + Send + Sync + 'static,
    {
        self.derived.push(Box::new(derive));
        self
    }

    /// Adds a capture run after the response arrives.
    #[must_use]
    pub fn capture(mut self, capture: Capture) -> Self {
        self.captures.push(capture);
        self
    }

    /// Step name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed expectations checked against the response.
    #[must_use]
    pub const fn suite(&self) -> &TestSuite {
        &self.suite
    }

    /// All expectations for a run with `ctx`: the fixed ones, then the derived.
    ///
    /// # Errors
    ///
    /// Returns the first derivation error, typically a missing context value.
    pub fn suite_for(&self, ctx: &WorkflowContext) -> Result<TestSuite, WorkflowError> {
        let mut suite = self.suite.clone();
        for derive in &self.derived {
            suite.assertions.extend(derive(ctx)?);
        }
        Ok(suite)
    }

    /// Builds the request this step would send with `ctx`.
    ///
    /// # Errors
    ///
    /// Returns the builder's error, typically a missing context value.
    pub fn build_request(&self, ctx: &WorkflowContext) -> Result<RequestSpec, WorkflowError> {
        (self.build)(ctx)
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("suite", &self.suite)
            .field("derived", &self.derived.len())
            .field("captures", &self.captures)
            .finish_non_exhaustive()
    }
}

/// An ordered, named sequence of steps.
#[derive(Debug)]
pub struct Workflow {
    name: String,
    steps: Vec<Step>,
    stop_on_failure: bool,
}

impl Workflow {
    /// Creates an empty workflow.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            stop_on_failure: false,
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Skips every remaining step once one does not pass.
    #[must_use]
    pub const fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Runs every step in order with a fresh context.
    ///
    /// Each step performs at most one logical request. A failing step does
    /// not stop later steps unless `stop_on_failure` is set; steps whose
    /// inputs are missing are skipped.
    pub async fn run<C, V>(&self, executor: &ExecuteRequest<C>, verifier: &V) -> ScenarioReport
    where
        C: HttpClient,
        V: ResponseVerifier + ?Sized,
    {
        let started = Instant::now();
        let mut ctx = WorkflowContext::new();
        let mut steps = Vec::with_capacity(self.steps.len());
        let mut halted = false;

        for step in &self.steps {
            let report = if halted {
                StepReport::skipped(&step.name, "an earlier step did not pass")
            } else {
                run_step(step, &mut ctx, executor, verifier).await
            };

            info!(
                scenario = %self.name,
                step = %report.name,
                outcome = report.status.label(),
                "step finished"
            );
            halted |= self.stop_on_failure && !report.passed();
            steps.push(report);
        }

        ScenarioReport {
            name: self.name.clone(),
            steps,
            duration_ms: elapsed_ms(started),
        }
    }
}

async fn run_step<C, V>(
    step: &Step,
    ctx: &mut WorkflowContext,
    executor: &ExecuteRequest<C>,
    verifier: &V,
) -> StepReport
where
    C: HttpClient,
    V: ResponseVerifier + ?Sized,
{
    let started = Instant::now();

    let prepared = step
        .build_request(ctx)
        .and_then(|request| Ok((request, step.suite_for(ctx)?)));
    let (request, suite) = match prepared {
        Ok(prepared) => prepared,
        Err(err @ WorkflowError::MissingValue { .. }) => {
            warn!(step = %step.name, error = %err, "skipping step");
            return StepReport::skipped(&step.name, err.to_string());
        }
        Err(err) => {
            return StepReport {
                name: step.name.clone(),
                method: None,
                url: None,
                status: StepStatus::Errored {
                    message: err.to_string(),
                },
                results: None,
                duration_ms: elapsed_ms(started),
            };
        }
    };

    let mut report = StepReport {
        name: step.name.clone(),
        method: Some(request.method),
        url: Some(request.url.clone()),
        status: StepStatus::Passed,
        results: None,
        duration_ms: 0,
    };

    let response = match executor.execute(&request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(step = %step.name, error = %err, "request failed");
            report.status = StepStatus::Errored {
                message: err.to_string(),
            };
            report.duration_ms = elapsed_ms(started);
            return report;
        }
    };

    let mut results = verifier.verify(&suite, &response);
    for capture in &step.captures {
        match (capture.extract)(&response) {
            Ok(value) => ctx.insert(capture.key.clone(), value),
            Err(err) => results.push(AssertionResult::fail(
                Assertion::JsonPath {
                    path: capture.source.clone(),
                    expected: None,
                },
                err.to_string(),
            )),
        }
    }

    if !results.all_passed() {
        report.status = StepStatus::Failed;
    }
    report.results = Some(results);
    report.duration_ms = elapsed_ms(started);
    report
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use apiprobe_domain::testing::TestResults;
    use pretty_assertions::assert_eq;

    use crate::ports::{HttpClientError, HttpFuture};

    /// Answers every request with the next scripted status/body and logs URLs.
    struct RecordingClient {
        replies: Mutex<Vec<Result<(u16, &'static str), HttpClientError>>>,
        urls: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn new(mut replies: Vec<Result<(u16, &'static str), HttpClientError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    impl HttpClient for RecordingClient {
        fn execute(&self, request: &RequestSpec) -> HttpFuture<'_> {
            self.urls.lock().unwrap().push(request.url.clone());
            let reply = self.replies.lock().unwrap().pop().expect("unexpected request");
            Box::pin(async move {
                reply.map(|(status, body)| {
                    ResponseSpec::new(status, HashMap::new(), body.as_bytes().to_vec(), Duration::ZERO)
                })
            })
        }
    }

    /// Checks status assertions only.
    struct StatusVerifier;

    impl ResponseVerifier for StatusVerifier {
        fn verify(&self, suite: &TestSuite, response: &ResponseSpec) -> TestResults {
            let results = suite
                .assertions
                .iter()
                .map(|assertion| match assertion {
                    Assertion::StatusCode { expected } if *expected != response.status => {
                        AssertionResult::fail(assertion.clone(), "status mismatch")
                    }
                    _ => AssertionResult::pass(assertion.clone()),
                })
                .collect();
            TestResults::new(&suite.name, results)
        }
    }

    fn id_capture() -> Capture {
        Capture::new("id", "$.id", |response| {
            response
                .body_as_json()
                .ok()
                .and_then(|json| json.get("id").map(ToString::to_string))
                .ok_or_else(|| WorkflowError::Capture {
                    key: "id".into(),
                    reason: "no id in body".into(),
                })
        })
    }

    fn chained_workflow() -> Workflow {
        Workflow::new("Chain")
            .step(
                Step::fixed(RequestSpec::post("Create", "https://example.com/items"))
                    .expect(Assertion::status(200))
                    .capture(id_capture()),
            )
            .step(
                Step::new("Read", |ctx| {
                    let id = ctx.require("id")?;
                    Ok(RequestSpec::get("Read", format!("https://example.com/items/{id}")))
                })
                .expect(Assertion::status(200)),
            )
            .step(
                Step::fixed(RequestSpec::get("Independent", "https://example.com/other"))
                    .expect(Assertion::status(200)),
            )
    }

    #[tokio::test]
    async fn captured_value_reaches_the_next_request() {
        let client = RecordingClient::new(vec![Ok((200, r#"{"id": 7}"#)), Ok((200, "{}")), Ok((200, "[]"))]);
        let executor = ExecuteRequest::new(Arc::clone(&client));

        let report = chained_workflow().run(&executor, &StatusVerifier).await;

        assert!(report.passed());
        assert_eq!(
            client.urls(),
            vec![
                "https://example.com/items",
                "https://example.com/items/7",
                "https://example.com/other"
            ]
        );
    }

    #[tokio::test]
    async fn missing_capture_skips_dependent_step_but_not_independent_ones() {
        let client = RecordingClient::new(vec![Ok((500, "oops")), Ok((200, "[]"))]);
        let executor = ExecuteRequest::new(Arc::clone(&client));

        let report = chained_workflow().run(&executor, &StatusVerifier).await;

        let create = report.step("Create").unwrap();
        assert_eq!(create.status, StepStatus::Failed);
        let failures: Vec<_> = create.results.as_ref().unwrap().failures().collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(
            failures[1].assertion,
            Assertion::JsonPath {
                path: "$.id".into(),
                expected: None
            }
        );

        assert_eq!(
            report.step("Read").unwrap().status,
            StepStatus::Skipped {
                reason: "no 'id' was captured by an earlier step".into()
            }
        );
        assert!(report.step("Independent").unwrap().passed());
        assert_eq!(client.urls().len(), 2);
    }

    #[tokio::test]
    async fn stop_on_failure_skips_everything_after_the_first_failure() {
        let client = RecordingClient::new(vec![Ok((200, r#"{"id": 1}"#)), Ok((404, ""))]);
        let executor = ExecuteRequest::new(Arc::clone(&client));

        let report = chained_workflow()
            .stop_on_failure(true)
            .run(&executor, &StatusVerifier)
            .await;

        assert_eq!(report.step("Read").unwrap().status, StepStatus::Failed);
        assert!(matches!(
            report.step("Independent").unwrap().status,
            StepStatus::Skipped { .. }
        ));
        assert_eq!(client.urls().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_as_errored() {
        let client = RecordingClient::new(vec![
            Err(HttpClientError::ConnectionFailed("reset by peer".into())),
            Ok((200, "[]")),
        ]);
        let executor = ExecuteRequest::new(Arc::clone(&client));

        let report = chained_workflow().run(&executor, &StatusVerifier).await;

        let create = report.step("Create").unwrap();
        assert!(matches!(
            &create.status,
            StepStatus::Errored { message } if message.contains("reset by peer")
        ));
        assert!(create.results.is_none());
        assert!(matches!(
            report.step("Read").unwrap().status,
            StepStatus::Skipped { .. }
        ));
    }

    #[tokio::test]
    async fn builder_domain_errors_are_reported_as_errored() {
        let client = RecordingClient::new(vec![]);
        let executor = ExecuteRequest::new(Arc::clone(&client));
        let workflow = Workflow::new("Broken").step(Step::new("Bad id", |_| {
            Err(DomainError::InvalidIdentifier("blank".into()).into())
        }));

        let report = workflow.run(&executor, &StatusVerifier).await;

        assert!(matches!(
            report.steps[0].status,
            StepStatus::Errored { .. }
        ));
        assert!(client.urls().is_empty());
    }

    fn derived_status_workflow() -> Workflow {
        Workflow::new("Derived")
            .step(
                Step::fixed(RequestSpec::post("Create", "https://example.com/items"))
                    .capture(id_capture()),
            )
            .step(
                Step::fixed(RequestSpec::get("Compare", "https://example.com/items/1"))
                    .expect(Assertion::IsJson)
                    .expect_derived(|ctx| {
                        Ok(vec![Assertion::status(ctx.require("id")?.parse().unwrap())])
                    }),
            )
    }

    #[tokio::test]
    async fn derived_expectations_use_captured_values() {
        let client = RecordingClient::new(vec![Ok((200, r#"{"id": 201}"#)), Ok((404, "{}"))]);
        let executor = ExecuteRequest::new(Arc::clone(&client));

        let report = derived_status_workflow().run(&executor, &StatusVerifier).await;

        let compare = report.step("Compare").unwrap();
        assert_eq!(compare.status, StepStatus::Failed);
        let results = compare.results.as_ref().unwrap();
        assert_eq!(results.total, 2);
        let failures: Vec<_> = results.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].assertion, Assertion::status(201));
    }

    #[tokio::test]
    async fn missing_value_for_derived_expectation_skips_the_step() {
        let client = RecordingClient::new(vec![Ok((200, "{}"))]);
        let executor = ExecuteRequest::new(Arc::clone(&client));

        let report = derived_status_workflow().run(&executor, &StatusVerifier).await;

        assert_eq!(
            report.step("Compare").unwrap().status,
            StepStatus::Skipped {
                reason: "no 'id' was captured by an earlier step".into()
            }
        );
        assert_eq!(client.urls(), vec!["https://example.com/items"]);
    }

    #[test]
    fn context_require_reports_the_missing_key() {
        let mut ctx = WorkflowContext::new();
        assert_eq!(
            ctx.require("bookingid"),
            Err(WorkflowError::MissingValue {
                key: "bookingid".into()
            })
        );
        ctx.insert("bookingid", "42");
        assert_eq!(ctx.require("bookingid"), Ok("42"));
    }
}

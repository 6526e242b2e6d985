//! Test runner implementation.
//!
//! Executes assertions against HTTP responses and produces test results.

use apiprobe_application::ports::ResponseVerifier;
use apiprobe_domain::response::ResponseSpec;
use apiprobe_domain::testing::{Assertion, AssertionResult, TestResults, TestSuite};
use jsonschema::{Draft, JSONSchema};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

const PREVIEW_CHARS: usize = 100;

/// Test runner that executes assertions against responses.
///
/// Every assertion in a suite is checked, so a report lists all mismatches
/// of a step rather than the first one.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestRunner;

impl TestRunner {
    /// Create a new test runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Run a test suite against a response.
    #[must_use]
    pub fn run(&self, suite: &TestSuite, response: &ResponseSpec) -> TestResults {
        let results = suite
            .assertions
            .iter()
            .map(|assertion| Self::run_assertion(assertion, response))
            .collect();

        let results = TestResults::new(&suite.name, results);
        debug!(
            suite = %suite.name,
            passed = results.passed,
            failed = results.failed,
            "assertions checked"
        );
        results
    }

    /// Run a single assertion against a response.
    #[must_use]
    pub fn run_assertion(assertion: &Assertion, response: &ResponseSpec) -> AssertionResult {
        match assertion {
            Assertion::StatusCode { expected } => check_status_code(assertion, response, *expected),
            Assertion::ResponseTime { max_ms } => check_response_time(assertion, response, *max_ms),
            Assertion::HeaderExists { name, value } => {
                check_header_exists(assertion, response, name, value.as_deref())
            }
            Assertion::HeaderMatches { name, pattern } => {
                check_header_matches(assertion, response, name, pattern)
            }
            Assertion::ContentType { expected } => check_content_type(assertion, response, expected),
            Assertion::BodyEquals { expected } => check_body_equals(assertion, response, expected),
            Assertion::BodyContains { text, ignore_case } => {
                check_body_contains(assertion, response, text, *ignore_case)
            }
            Assertion::IsJson => check_is_json(assertion, response),
            Assertion::JsonPath { path, expected } => {
                check_json_path(assertion, response, path, expected.as_ref())
            }
            Assertion::JsonSchema { name, schema } => {
                check_json_schema(assertion, response, name, schema)
            }
        }
    }
}

impl ResponseVerifier for TestRunner {
    fn verify(&self, suite: &TestSuite, response: &ResponseSpec) -> TestResults {
        self.run(suite, response)
    }
}

fn check_status_code(
    assertion: &Assertion,
    response: &ResponseSpec,
    expected: u16,
) -> AssertionResult {
    let actual = response.status_code();
    if response.status == expected {
        AssertionResult::pass_with_value(assertion.clone(), actual.to_string())
    } else {
        AssertionResult::fail_with_value(
            assertion.clone(),
            actual.to_string(),
            format!("Expected status {expected}, got {actual}"),
        )
    }
}

fn check_response_time(assertion: &Assertion, response: &ResponseSpec, max_ms: u64) -> AssertionResult {
    let actual_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX);
    if actual_ms <= max_ms {
        AssertionResult::pass_with_value(assertion.clone(), format!("{actual_ms}ms"))
    } else {
        AssertionResult::fail_with_value(
            assertion.clone(),
            format!("{actual_ms}ms"),
            format!("Response took {actual_ms}ms, expected <= {max_ms}ms"),
        )
    }
}

fn check_header_exists(
    assertion: &Assertion,
    response: &ResponseSpec,
    name: &str,
    expected_value: Option<&str>,
) -> AssertionResult {
    match (response.get_header(name), expected_value) {
        (Some(actual), Some(expected)) if actual != expected => AssertionResult::fail_with_value(
            assertion.clone(),
            actual.clone(),
            format!("Header '{name}' value mismatch: expected '{expected}', got '{actual}'"),
        ),
        (Some(actual), _) => AssertionResult::pass_with_value(assertion.clone(), actual.clone()),
        (None, _) => AssertionResult::fail(assertion.clone(), format!("Header '{name}' not found")),
    }
}

fn check_header_matches(
    assertion: &Assertion,
    response: &ResponseSpec,
    name: &str,
    pattern: &str,
) -> AssertionResult {
    let Some(actual) = response.get_header(name) else {
        return AssertionResult::fail(assertion.clone(), format!("Header '{name}' not found"));
    };
    match Regex::new(pattern) {
        Ok(regex) if regex.is_match(actual) => {
            AssertionResult::pass_with_value(assertion.clone(), actual.clone())
        }
        Ok(_) => AssertionResult::fail_with_value(
            assertion.clone(),
            actual.clone(),
            format!("Header '{name}' value '{actual}' does not match pattern '{pattern}'"),
        ),
        Err(e) => AssertionResult::fail(
            assertion.clone(),
            format!("Invalid regex pattern '{pattern}': {e}"),
        ),
    }
}

fn check_content_type(assertion: &Assertion, response: &ResponseSpec, expected: &str) -> AssertionResult {
    match &response.content_type {
        Some(actual) if actual.contains(expected) => {
            AssertionResult::pass_with_value(assertion.clone(), actual.clone())
        }
        Some(actual) => AssertionResult::fail_with_value(
            assertion.clone(),
            actual.clone(),
            format!("Content-Type '{actual}' does not contain '{expected}'"),
        ),
        None => AssertionResult::fail(assertion.clone(), "No Content-Type header present"),
    }
}

fn check_body_equals(assertion: &Assertion, response: &ResponseSpec, expected: &str) -> AssertionResult {
    let matches = response.body == expected
        || matches!(response.body_as_json(), Ok(Value::String(ref s)) if s == expected);

    if matches {
        AssertionResult::pass(assertion.clone())
    } else {
        AssertionResult::fail_with_value(
            assertion.clone(),
            response.body_preview(PREVIEW_CHARS),
            format!("Body does not equal '{expected}'"),
        )
    }
}

fn check_body_contains(
    assertion: &Assertion,
    response: &ResponseSpec,
    text: &str,
    ignore_case: bool,
) -> AssertionResult {
    let body = &response.body;
    let contains = if ignore_case {
        body.to_lowercase().contains(&text.to_lowercase())
    } else {
        body.contains(text)
    };

    if contains {
        AssertionResult::pass(assertion.clone())
    } else {
        AssertionResult::fail_with_value(
            assertion.clone(),
            response.body_preview(PREVIEW_CHARS),
            format!("Body does not contain '{text}'"),
        )
    }
}

fn check_is_json(assertion: &Assertion, response: &ResponseSpec) -> AssertionResult {
    match response.body_as_json() {
        Ok(_) => AssertionResult::pass(assertion.clone()),
        Err(e) => AssertionResult::fail(assertion.clone(), format!("Body is not valid JSON: {e}")),
    }
}

fn check_json_path(
    assertion: &Assertion,
    response: &ResponseSpec,
    path: &str,
    expected: Option<&Value>,
) -> AssertionResult {
    let json = match response.body_as_json() {
        Ok(json) => json,
        Err(e) => {
            return AssertionResult::fail_with_value(
                assertion.clone(),
                response.body_preview(PREVIEW_CHARS),
                format!("Failed to parse body as JSON: {e}"),
            );
        }
    };

    match (query_json_path(&json, path), expected) {
        (Ok(Some(value)), Some(expected)) if &value != expected => AssertionResult::fail_with_value(
            assertion.clone(),
            value.to_string(),
            format!("JSON path '{path}' value mismatch: expected {expected}, got {value}"),
        ),
        (Ok(Some(value)), _) => AssertionResult::pass_with_value(assertion.clone(), value.to_string()),
        (Ok(None), _) => AssertionResult::fail(assertion.clone(), format!("JSON path '{path}' not found")),
        (Err(e), _) => AssertionResult::fail(assertion.clone(), format!("Invalid JSON path '{path}': {e}")),
    }
}

fn check_json_schema(
    assertion: &Assertion,
    response: &ResponseSpec,
    name: &str,
    schema: &Value,
) -> AssertionResult {
    let compiled = match JSONSchema::options().with_draft(Draft::Draft7).compile(schema) {
        Ok(compiled) => compiled,
        Err(e) => {
            return AssertionResult::fail(assertion.clone(), format!("Invalid schema '{name}': {e}"));
        }
    };

    let json = match response.body_as_json() {
        Ok(json) => json,
        Err(e) => {
            return AssertionResult::fail_with_value(
                assertion.clone(),
                response.body_preview(PREVIEW_CHARS),
                format!("Failed to parse body as JSON: {e}"),
            );
        }
    };

    let violations: Vec<String> = match compiled.validate(&json) {
        Ok(()) => return AssertionResult::pass(assertion.clone()),
        Err(errors) => errors
            .map(|e| {
                let at = e.instance_path.to_string();
                let at = if at.is_empty() { "/".to_string() } else { at };
                format!("{at}: {}", e.to_string().replace('\n', " "))
            })
            .collect(),
    };

    AssertionResult::fail_with_value(
        assertion.clone(),
        response.body_preview(PREVIEW_CHARS),
        format!("Body does not match schema '{name}': {}", violations.join("; ")),
    )
}

/// Query a JSON value using a simple JSONPath-like syntax.
/// Supports: $.field, $.field.nested, $.array[0], $.array[*]
fn query_json_path(json: &Value, path: &str) -> Result<Option<Value>, String> {
    let Some(path) = path.trim().strip_prefix('$') else {
        return Err("JSON path must start with '$'".to_string());
    };
    if path.is_empty() {
        return Ok(Some(json.clone()));
    }

    let path = path.strip_prefix('.').unwrap_or(path);
    let mut current = json;

    for segment in split_path_segments(path) {
        if let Some((name, index)) = parse_array_access(&segment) {
            if !name.is_empty() {
                match current.get(name) {
                    Some(v) => current = v,
                    None => return Ok(None),
                }
            }
            if index == "*" {
                return Ok(Some(current.clone()));
            }
            let idx: usize = index
                .parse()
                .map_err(|_| format!("Invalid array index: {index}"))?;
            match current.get(idx) {
                Some(v) => current = v,
                None => return Ok(None),
            }
        } else {
            match current.get(segment.as_str()) {
                Some(v) => current = v,
                None => return Ok(None),
            }
        }
    }

    Ok(Some(current.clone()))
}

/// Split a path into segments, respecting array brackets.
fn split_path_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;

    for ch in path.chars() {
        match ch {
            '.' if !in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                in_bracket = true;
                current.push(ch);
            }
            ']' => {
                in_bracket = false;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Parse array access like "field[0]" into ("field", "0").
fn parse_array_access(segment: &str) -> Option<(&str, &str)> {
    let bracket_start = segment.find('[')?;
    let inner = segment.strip_suffix(']')?;
    Some((&segment[..bracket_start], &inner[bracket_start + 1..]))
}

//! Run reports.
//!
//! A suite run produces one [`SuiteReport`] holding a [`ScenarioReport`] per
//! scenario and a [`StepReport`] per step. Reports are plain data; the
//! `Display` impls render the console summary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::request::HttpMethod;
use crate::testing::TestResults;

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    /// The response satisfied every assertion.
    Passed,
    /// At least one assertion failed.
    Failed,
    /// The step was not sent.
    Skipped {
        /// Why the step was not sent.
        reason: String,
    },
    /// The request could not be completed.
    Errored {
        /// Transport or validation error message.
        message: String,
    },
}

impl StepStatus {
    /// Short label used in the console summary.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped { .. } => "SKIP",
            Self::Errored { .. } => "ERROR",
        }
    }
}

/// Report for one step of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name.
    pub name: String,
    /// Method of the request, when one was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// URL of the request, when one was built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Outcome.
    pub status: StepStatus,
    /// Assertion outcomes, when a response was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<TestResults>,
    /// Wall time spent on the step, retries included.
    pub duration_ms: u64,
}

impl StepReport {
    /// Creates a report for a step that was never sent.
    #[must_use]
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: None,
            url: None,
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
            results: None,
            duration_ms: 0,
        }
    }

    /// Returns true if the step passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.status, StepStatus::Passed)
    }
}

/// Report for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Step reports in execution order.
    pub steps: Vec<StepReport>,
    /// Wall time spent on the scenario.
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Returns true if every step passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepReport::passed)
    }

    /// Looks up a step report by name.
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Report for a whole suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique id of this run, also attached to log spans.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Scenario reports in execution order.
    pub scenarios: Vec<ScenarioReport>,
    /// Wall time spent on the run.
    pub duration_ms: u64,
}

/// Step counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTally {
    /// Passed steps.
    pub passed: usize,
    /// Failed steps.
    pub failed: usize,
    /// Skipped steps.
    pub skipped: usize,
    /// Errored steps.
    pub errored: usize,
}

impl StepTally {
    /// Total number of steps.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errored
    }
}

impl SuiteReport {
    /// Returns true if every step of every scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }

    /// Looks up a scenario report by name.
    #[must_use]
    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Counts steps by outcome.
    #[must_use]
    pub fn tally(&self) -> StepTally {
        let mut tally = StepTally::default();
        for step in self.scenarios.iter().flat_map(|s| &s.steps) {
            match step.status {
                StepStatus::Passed => tally.passed += 1,
                StepStatus::Failed => tally.failed += 1,
                StepStatus::Skipped { .. } => tally.skipped += 1,
                StepStatus::Errored { .. } => tally.errored += 1,
            }
        }
        tally
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  [{}] {}", self.status.label(), self.name)?;
        if let (Some(method), Some(url)) = (self.method, &self.url) {
            write!(f, " ({method} {url}, {} ms)", self.duration_ms)?;
        }
        writeln!(f)?;
        match &self.status {
            StepStatus::Skipped { reason } => writeln!(f, "      skipped: {reason}")?,
            StepStatus::Errored { message } => writeln!(f, "      error: {message}")?,
            StepStatus::Passed | StepStatus::Failed => {}
        }
        if let Some(results) = &self.results {
            for failure in results.failures() {
                write!(f, "      x {}", failure.assertion.description())?;
                if let Some(actual) = &failure.actual {
                    write!(f, " (actual: {actual})")?;
                }
                if let Some(error) = &failure.error {
                    write!(f, ": {error}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} ({})", self.run_id, self.started_at.to_rfc3339())?;
        for scenario in &self.scenarios {
            let verdict = if scenario.passed() { "ok" } else { "FAILED" };
            writeln!(f, "{} ... {verdict}", scenario.name)?;
            for step in &scenario.steps {
                write!(f, "{step}")?;
            }
        }
        let tally = self.tally();
        write!(
            f,
            "{} steps: {} passed, {} failed, {} skipped, {} errored in {} ms",
            tally.total(),
            tally.passed,
            tally.failed,
            tally.skipped,
            tally.errored,
            self.duration_ms
        )
    }
}

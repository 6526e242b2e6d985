//! Run suite use case.

use std::sync::Arc;
use std::time::Instant;

use apiprobe_domain::report::SuiteReport;
use apiprobe_domain::SuiteSettings;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::error::ApplicationResult;
use crate::execute_request::ExecuteRequest;
use crate::ports::{Clock, HttpClient, ResponseVerifier};
use crate::scenarios::standard_scenarios;
use crate::workflow::Workflow;

/// Use case for running scenarios one after another into a single report.
pub struct RunSuite<C: HttpClient, V: ResponseVerifier + ?Sized> {
    executor: ExecuteRequest<C>,
    verifier: Arc<V>,
    clock: Arc<dyn Clock>,
}

impl<C: HttpClient, V: ResponseVerifier + ?Sized> RunSuite<C, V> {
    /// Creates a new `RunSuite` use case.
    #[must_use]
    pub fn new(executor: ExecuteRequest<C>, verifier: Arc<V>, clock: Arc<dyn Clock>) -> Self {
        Self {
            executor,
            verifier,
            clock,
        }
    }

    /// Runs `scenarios` in order. No two requests are ever in flight at once.
    pub async fn run(&self, scenarios: &[Workflow]) -> SuiteReport {
        let run_id = Uuid::now_v7();
        let started_at = self.clock.now();
        let started = Instant::now();
        let mut reports = Vec::with_capacity(scenarios.len());

        for workflow in scenarios {
            let span = info_span!("scenario", run = %run_id, scenario = workflow.name());
            let report = workflow
                .run(&self.executor, self.verifier.as_ref())
                .instrument(span)
                .await;
            info!(
                scenario = %report.name,
                passed = report.passed(),
                duration_ms = report.duration_ms,
                "scenario finished"
            );
            reports.push(report);
        }

        SuiteReport {
            run_id,
            started_at,
            scenarios: reports,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Validates `settings`, builds the standard scenarios and runs them.
    ///
    /// # Errors
    /// - Returns error if a base URL or the retry settings are invalid
    /// - Returns error if the credential settings are unusable
    pub async fn run_standard(&self, settings: &SuiteSettings) -> ApplicationResult<SuiteReport> {
        settings.validate()?;
        let scenarios = standard_scenarios(settings)?;
        Ok(self.run(&scenarios).await)
    }
}

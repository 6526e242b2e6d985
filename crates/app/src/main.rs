//! Apiprobe - Main Entry Point
//!
//! Loads settings, runs every standard scenario against the configured
//! services and prints the report. Exits with 1 when any step did not
//! pass and 2 when the suite could not start.

use std::process::ExitCode;
use std::sync::Arc;

use apiprobe_application::{ExecuteRequest, RetryPolicy, RunSuite};
use apiprobe_domain::report::SuiteReport;
use apiprobe_infrastructure::{ReqwestHttpClient, SystemClock, TestRunner, init_logging, load_settings};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("apiprobe: logging disabled: {e}");
    }

    tracing::info!("Starting apiprobe v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(report) => {
            println!("{report}");
            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "suite could not start");
            eprintln!("apiprobe: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<SuiteReport, Box<dyn std::error::Error>> {
    let settings = load_settings()?;
    let client = Arc::new(ReqwestHttpClient::from_settings(&settings)?);
    let executor = ExecuteRequest::new(client).with_retry(RetryPolicy::from(&settings.retry));
    let suite = RunSuite::new(
        executor,
        Arc::new(TestRunner::new()),
        Arc::new(SystemClock::new()),
    );

    Ok(suite.run_standard(&settings).await?)
}

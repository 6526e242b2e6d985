//! Response verification port

use apiprobe_domain::response::ResponseSpec;
use apiprobe_domain::testing::{TestResults, TestSuite};

/// Port for evaluating a step's assertions against its response.
///
/// Verification never fails as a whole: every assertion yields its own
/// pass/fail result so a report can list each mismatch.
pub trait ResponseVerifier: Send + Sync {
    /// Runs every assertion of `suite` against `response`.
    fn verify(&self, suite: &TestSuite, response: &ResponseSpec) -> TestResults;
}

//! Apiprobe Domain - Core test suite types
//!
//! This crate defines the domain model for the apiprobe test suite:
//! request and response shapes, assertions, the booking payload,
//! credentials, run reports and suite settings.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod booking;
pub mod error;
pub mod report;
pub mod request;
pub mod response;
pub mod settings;
pub mod testing;

pub use auth::Credential;
pub use booking::{BookingDates, BookingId, BookingRecord};
pub use error::{DomainError, DomainResult};
pub use report::{ScenarioReport, StepReport, StepStatus, StepTally, SuiteReport};
pub use settings::{CredentialSettings, RetrySettings, SuiteSettings};
pub use testing::{Assertion, AssertionResult, TestResults, TestSuite};

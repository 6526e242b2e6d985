//! Apiprobe Application - Ports, workflow and scenarios
//!
//! This crate defines the application layer with:
//! - Port traits (HTTP transport, response verification, clock)
//! - Request execution with bounded retry on transport failures
//! - The workflow pipeline that threads captured values between steps
//! - The booking and posts scenarios, and the suite runner

pub mod error;
pub mod execute_request;
pub mod ports;
pub mod retry;
pub mod run_suite;
pub mod scenarios;
pub mod workflow;

pub use error::{ApplicationError, ApplicationResult};
pub use execute_request::{ExecuteRequest, ExecuteRequestError, ExecuteResult};
pub use ports::{Clock, HttpClient, HttpClientError, HttpFuture, ResponseVerifier};
pub use retry::RetryPolicy;
pub use run_suite::RunSuite;
pub use workflow::{Capture, Step, Workflow, WorkflowContext, WorkflowError};

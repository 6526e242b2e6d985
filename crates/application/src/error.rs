//! Application error types

use apiprobe_domain::DomainError;
use thiserror::Error;

use crate::execute_request::ExecuteRequestError;
use crate::workflow::WorkflowError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A request could not be executed.
    #[error("request error: {0}")]
    Execute(#[from] ExecuteRequestError),

    /// A workflow could not be assembled.
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

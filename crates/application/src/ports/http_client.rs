//! HTTP client port

use std::future::Future;
use std::pin::Pin;

use apiprobe_domain::request::{HttpMethod, RequestSpec};
use apiprobe_domain::response::ResponseSpec;
use thiserror::Error;

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + 'a>>;

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation so the workflow
/// logic stays independent of a specific HTTP library. Any status code,
/// including 4xx and 5xx, is a successful execution; only failures to
/// obtain a response are errors.
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained.
    fn execute(&self, request: &RequestSpec) -> HttpFuture<'_>;
}

/// Errors raised while obtaining a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("could not resolve host '{host}': {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The remote end refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    BodyRead(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Redirect limit.
        max: usize,
    },

    /// The request body was rejected before sending.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Any other client error.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true for failures of the network path itself.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::DnsError { .. }
                | Self::ConnectionRefused { .. }
                | Self::ConnectionFailed(_)
                | Self::BodyRead(_)
        )
    }

    /// Returns true if the request provably never reached the server.
    #[must_use]
    pub const fn is_pre_connect(&self) -> bool {
        matches!(self, Self::DnsError { .. } | Self::ConnectionRefused { .. })
    }

    /// Returns true if a request with `method` may be sent again after this error.
    ///
    /// Non-idempotent requests are only repeated when they cannot have
    /// reached the server, so a retry never creates a second booking.
    #[must_use]
    pub const fn is_retryable_for(&self, method: HttpMethod) -> bool {
        if method.is_idempotent() {
            self.is_transport()
        } else {
            self.is_pre_connect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_of_transport_errors() {
        assert!(HttpClientError::Timeout { timeout_ms: 10 }.is_transport());
        assert!(HttpClientError::ConnectionFailed("reset".into()).is_transport());
        assert!(!HttpClientError::InvalidUrl("x".into()).is_transport());
        assert!(!HttpClientError::TooManyRedirects { max: 10 }.is_transport());
    }

    #[test]
    fn post_is_only_retried_before_connecting() {
        let refused = HttpClientError::ConnectionRefused {
            host: "localhost".into(),
            port: 1,
        };
        let timeout = HttpClientError::Timeout { timeout_ms: 10 };

        assert!(refused.is_retryable_for(HttpMethod::Post));
        assert!(!timeout.is_retryable_for(HttpMethod::Post));
        assert!(timeout.is_retryable_for(HttpMethod::Get));
        assert!(timeout.is_retryable_for(HttpMethod::Put));
    }
}

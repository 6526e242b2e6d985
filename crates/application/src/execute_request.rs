//! Execute Request Use Case
//!
//! Sends one request through the `HttpClient` port, validating it first and
//! retrying transport failures according to a [`RetryPolicy`].

use std::sync::Arc;

use apiprobe_domain::request::RequestSpec;
use apiprobe_domain::response::ResponseSpec;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ports::{HttpClient, HttpClientError};
use crate::retry::RetryPolicy;

/// Result type for request execution.
pub type ExecuteResult = Result<ResponseSpec, ExecuteRequestError>;

/// Error type for the execute request use case.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecuteRequestError {
    /// URL is empty.
    #[error("URL is required")]
    EmptyUrl,

    /// URL is invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP request failed after all permitted attempts.
    #[error("{source} (after {attempts} attempt(s))")]
    HttpError {
        /// Last error returned by the client.
        source: HttpClientError,
        /// Attempts made.
        attempts: u32,
    },
}

/// Use case for executing HTTP requests.
///
/// # Example
///
/// ```ignore
/// let executor = ExecuteRequest::new(Arc::new(ReqwestHttpClient::new()?))
///     .with_retry(RetryPolicy::new(3, Duration::from_millis(500)));
///
/// let request = RequestSpec::get("Posts", "https://jsonplaceholder.typicode.com/posts");
/// let response = executor.execute(&request).await?;
/// ```
pub struct ExecuteRequest<C: HttpClient> {
    client: Arc<C>,
    retry: RetryPolicy,
}

impl<C: HttpClient> ExecuteRequest<C> {
    /// Creates a new `ExecuteRequest` use case that never retries.
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Executes the request and returns the response.
    ///
    /// Any HTTP status counts as a response. Transport failures are retried
    /// while the policy allows and the method is safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns `ExecuteRequestError` on validation failure, or on HTTP
    /// failure once retries are exhausted or not permitted.
    pub async fn execute(&self, request: &RequestSpec) -> ExecuteResult {
        Self::validate(request)?;

        let mut attempt = 1;
        loop {
            debug!(
                request = %request.name,
                method = %request.method,
                url = %request.url,
                attempt,
                "sending request"
            );
            match self.client.execute(request).await {
                Ok(response) => {
                    debug!(
                        request = %request.name,
                        status = response.status,
                        elapsed = %response.duration_display(),
                        "received response"
                    );
                    return Ok(response);
                }
                Err(source)
                    if attempt < self.retry.max_attempts()
                        && source.is_retryable_for(request.method) =>
                {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        request = %request.name,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %source,
                        "transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(ExecuteRequestError::HttpError {
                        source,
                        attempts: attempt,
                    });
                }
            }
        }
    }

    /// Validates the request before execution.
    fn validate(request: &RequestSpec) -> Result<(), ExecuteRequestError> {
        if request.url.trim().is_empty() {
            return Err(ExecuteRequestError::EmptyUrl);
        }

        if !request.url.starts_with("http://") && !request.url.starts_with("https://") {
            return Err(ExecuteRequestError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        request
            .parse_url()
            .map_err(|e| ExecuteRequestError::InvalidUrl(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use crate::ports::HttpFuture;

    /// Mock HTTP client replaying scripted outcomes, counting calls.
    struct ScriptedClient {
        outcomes: Mutex<Vec<Result<ResponseSpec, HttpClientError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedClient {
        fn new(mut outcomes: Vec<Result<ResponseSpec, HttpClientError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl HttpClient for ScriptedClient {
        fn execute(&self, _request: &RequestSpec) -> HttpFuture<'_> {
            *self.calls.lock().unwrap() += 1;
            let next = self
                .outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(HttpClientError::Other("script exhausted".into())));
            Box::pin(async move { next })
        }
    }

    fn ok(status: u16) -> Result<ResponseSpec, HttpClientError> {
        Ok(ResponseSpec::new(
            status,
            HashMap::new(),
            b"OK".to_vec(),
            Duration::from_millis(5),
        ))
    }

    fn refused() -> Result<ResponseSpec, HttpClientError> {
        Err(HttpClientError::ConnectionRefused {
            host: "localhost".into(),
            port: 9,
        })
    }

    fn timeout() -> Result<ResponseSpec, HttpClientError> {
        Err(HttpClientError::Timeout { timeout_ms: 5 })
    }

    fn retrying(client: &Arc<ScriptedClient>, attempts: u32) -> ExecuteRequest<ScriptedClient> {
        ExecuteRequest::new(Arc::clone(client)).with_retry(RetryPolicy::new(attempts, Duration::ZERO))
    }

    #[tokio::test]
    async fn returns_error_statuses_as_responses() {
        let client = Arc::new(ScriptedClient::new(vec![ok(403)]));
        let response = retrying(&client, 3)
            .execute(&RequestSpec::put("Update", "https://example.com/booking/10"))
            .await
            .expect("403 is a response");

        assert_eq!(response.status, 403);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn retries_transport_failures_until_success() {
        let client = Arc::new(ScriptedClient::new(vec![timeout(), refused(), ok(200)]));
        let response = retrying(&client, 3)
            .execute(&RequestSpec::get("Read", "https://example.com/booking/1"))
            .await
            .expect("third attempt succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let client = Arc::new(ScriptedClient::new(vec![timeout(), timeout(), timeout()]));
        let err = retrying(&client, 2)
            .execute(&RequestSpec::get("Read", "https://example.com/booking/1"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecuteRequestError::HttpError {
                source: HttpClientError::Timeout { timeout_ms: 5 },
                attempts: 2
            }
        );
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn post_is_not_repeated_after_a_timeout() {
        let client = Arc::new(ScriptedClient::new(vec![timeout(), ok(200)]));
        let result = retrying(&client, 3)
            .execute(&RequestSpec::post("Create", "https://example.com/booking"))
            .await;

        assert!(result.is_err());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn post_is_repeated_when_the_connection_was_refused() {
        let client = Arc::new(ScriptedClient::new(vec![refused(), ok(200)]));
        let result = retrying(&client, 3)
            .execute(&RequestSpec::post("Create", "https://example.com/booking"))
            .await;

        assert!(result.is_ok());
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn non_transport_errors_are_not_retried() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(HttpClientError::TooManyRedirects { max: 10 }),
            ok(200),
        ]));
        let result = retrying(&client, 3)
            .execute(&RequestSpec::get("Read", "https://example.com/booking/1"))
            .await;

        assert!(result.is_err());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn rejects_empty_and_non_http_urls_without_sending() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let executor = retrying(&client, 1);

        let empty = executor.execute(&RequestSpec::get("Empty", "  ")).await;
        assert_eq!(empty, Err(ExecuteRequestError::EmptyUrl));

        let ftp = executor.execute(&RequestSpec::get("Ftp", "ftp://example.com")).await;
        assert!(matches!(ftp, Err(ExecuteRequestError::InvalidUrl(_))));
        assert_eq!(client.calls(), 0);
    }
}

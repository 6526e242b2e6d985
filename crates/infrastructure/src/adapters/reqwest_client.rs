//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Any response, whatever its status, is returned as-is; only failures to
//! obtain one are mapped to `HttpClientError`.

use std::collections::HashMap;
use std::error::Error as _;
use std::time::{Duration, Instant};

use apiprobe_application::ports::{HttpClient, HttpClientError, HttpFuture};
use apiprobe_domain::{
    SuiteSettings,
    request::{HttpMethod, RequestBody, RequestBodyKind, RequestSpec},
    response::ResponseSpec,
};
use reqwest::{Client, Method, Url};
use tracing::debug;

const MAX_REDIRECTS: usize = 10;
const USER_AGENT: &str = concat!("apiprobe/", env!("CARGO_PKG_VERSION"));

/// HTTP client implementation using reqwest.
///
/// Wraps `reqwest::Client` and applies the configured timeout to every
/// request.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    default_timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client.
    ///
    /// Redirects are followed up to 10 hops and TLS certificates are verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(default_timeout: Duration) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            default_timeout,
        })
    }

    /// Creates a client using the suite's configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn from_settings(settings: &SuiteSettings) -> Result<Self, HttpClientError> {
        Self::new(Duration::from_millis(settings.timeout_ms))
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        }
    }

    /// Builds the request body from domain `RequestBody`.
    fn build_body(
        builder: reqwest::RequestBuilder,
        body: &RequestBody,
    ) -> Result<reqwest::RequestBuilder, HttpClientError> {
        match &body.kind {
            RequestBodyKind::None => Ok(builder),
            RequestBodyKind::Raw { .. } => {
                if body
                    .content_type()
                    .is_some_and(|ct| ct.contains("application/json"))
                    && !body.is_empty()
                {
                    serde_json::from_str::<serde_json::Value>(&body.content)
                        .map_err(|e| HttpClientError::InvalidBody(format!("invalid JSON: {e}")))?;
                }
                Ok(builder.body(body.content.clone()))
            }
        }
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        let host = error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string();

        if error.is_connect() {
            let message = error_chain(error);
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError { host, message };
            }
            if lower.contains("refused") {
                let port = error
                    .url()
                    .and_then(Url::port_or_known_default)
                    .unwrap_or(80);
                return HttpClientError::ConnectionRefused { host, port };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return HttpClientError::TooManyRedirects { max: MAX_REDIRECTS };
        }

        if error.is_request() {
            return HttpClientError::ConnectionFailed(error_chain(error));
        }

        HttpClientError::Other(error_chain(error))
    }
}

/// Joins an error with its sources; reqwest keeps the useful part
/// ("Connection refused", resolver messages) in the source chain.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: &RequestSpec) -> HttpFuture<'_> {
        let method = request.method;
        let url = request.url.clone();
        let headers: Vec<_> = request.headers.iter().cloned().collect();
        let body = request.body.clone();
        let timeout = self.default_timeout;

        Box::pin(async move {
            let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            let parsed_url =
                Url::parse(&url).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {url}")))?;

            let start = Instant::now();

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(method), parsed_url)
                .timeout(timeout);

            for header in &headers {
                builder = builder.header(&header.name, &header.value);
            }

            if let Some(content_type) = body.content_type() {
                let has_content_type = headers
                    .iter()
                    .any(|h| h.name.eq_ignore_ascii_case("content-type"));
                if !has_content_type {
                    builder = builder.header("Content-Type", content_type);
                }
            }

            builder = Self::build_body(builder, &body)?;

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();
            let response_headers: HashMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();

            let body_bytes = response
                .bytes()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        HttpClientError::Timeout { timeout_ms }
                    } else {
                        HttpClientError::BodyRead(error_chain(&e))
                    }
                })?
                .to_vec();

            let duration = start.elapsed();
            debug!(
                %method,
                %url,
                status,
                bytes = body_bytes.len(),
                elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "response received"
            );

            Ok(ResponseSpec::new(status, response_headers, body_bytes, duration))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn maps_every_domain_method() {
        assert_eq!(ReqwestHttpClient::to_reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(ReqwestHttpClient::to_reqwest_method(HttpMethod::Post), Method::POST);
        assert_eq!(ReqwestHttpClient::to_reqwest_method(HttpMethod::Put), Method::PUT);
    }

    #[test]
    fn builds_from_default_settings() {
        assert!(ReqwestHttpClient::from_settings(&SuiteSettings::default()).is_ok());
    }

    #[test]
    fn rejects_invalid_json_body() {
        let body = RequestBody::json("{invalid json}");
        let builder = Client::new().post("https://example.com");
        let result = ReqwestHttpClient::build_body(builder, &body);
        assert!(matches!(result, Err(HttpClientError::InvalidBody(_))));
    }

    #[test]
    fn accepts_valid_json_body() {
        let body = RequestBody::json(r#"{"firstname": "Julia"}"#);
        let builder = Client::new().post("https://example.com");
        assert!(ReqwestHttpClient::build_body(builder, &body).is_ok());
    }

    #[tokio::test]
    async fn closed_port_is_a_transport_failure() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();
        let request = RequestSpec::get("closed", format!("http://127.0.0.1:{port}/posts"));

        let error = client.execute(&request).await.unwrap_err();

        assert!(error.is_transport(), "unexpected error: {error:?}");
    }
}

//! Request specification type

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Header, Headers, HttpMethod, RequestBody};
use crate::auth::Credential;
use crate::error::{DomainError, DomainResult};

/// Complete specification for one HTTP call issued by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Human-readable name, used in logs and reports
    pub name: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute target URL
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
}

impl RequestSpec {
    /// Creates a request with the given method and URL and no headers or body.
    #[must_use]
    pub fn new(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            url: url.into(),
            headers: Headers::new(),
            body: RequestBody::none(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Get, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Post, url)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Put, url)
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(Header::new(name, value));
        self
    }

    /// Sets a JSON body and the matching `Content-Type` header.
    #[must_use]
    pub fn with_json(mut self, value: &serde_json::Value) -> Self {
        self.body = RequestBody::json_value(value);
        self.with_header("Content-Type", "application/json")
    }

    /// Sets the `Authorization` header from a credential.
    #[must_use]
    pub fn with_credential(self, credential: &Credential) -> Self {
        self.with_header("Authorization", credential.header_value())
    }

    /// Validates the URL and returns the parsed version.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn parse_url(&self) -> DomainResult<Url> {
        Url::parse(&self.url).map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.url)))
    }
}

/// Appends path segments to a base URL.
///
/// Each segment is percent-encoded on its own, so an identifier can never
/// introduce extra path components or a query string.
///
/// # Errors
///
/// Returns an error if the base URL is malformed or cannot carry a path.
pub fn join_path<S: AsRef<str>>(base: &str, segments: &[S]) -> DomainResult<String> {
    let mut url = Url::parse(base).map_err(|e| DomainError::InvalidUrl(format!("{e}: {base}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| DomainError::InvalidUrl(format!("cannot be a base: {base}")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment.as_ref());
        }
    }
    Ok(url.into())
}

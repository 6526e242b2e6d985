//! Suite settings domain model
//!
//! Endpoints, credentials and transport knobs, resolved once when the suite
//! starts. Defaults point at the public demo services.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::Credential;
use crate::booking::BookingId;
use crate::error::{DomainError, DomainResult};

/// Credential source for authorized booking updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// Basic auth user name.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Pre-encoded token; takes precedence over username/password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password123".to_string(),
            token: None,
        }
    }
}

impl CredentialSettings {
    /// Builds the credential these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured token is blank or has whitespace.
    pub fn credential(&self) -> DomainResult<Credential> {
        match &self.token {
            Some(token) => Credential::from_token(token.clone()),
            None => Ok(Credential::basic(&self.username, &self.password)),
        }
    }
}

/// Bounded retry on transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per request, first one included.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

/// Everything the suite needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteSettings {
    /// Base URL of the booking service.
    pub booking_base_url: String,
    /// Base URL of the posts service.
    pub posts_base_url: String,
    /// Credential for authorized updates.
    pub credential: CredentialSettings,
    /// Pre-existing booking targeted by the rejection checks.
    pub fixed_booking_id: u64,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Retry policy for transport failures.
    pub retry: RetrySettings,
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self {
            booking_base_url: "https://restful-booker.herokuapp.com".to_string(),
            posts_base_url: "https://jsonplaceholder.typicode.com".to_string(),
            credential: CredentialSettings::default(),
            fixed_booking_id: 10,
            timeout_ms: 30_000,
            retry: RetrySettings::default(),
        }
    }
}

impl SuiteSettings {
    /// Returns the identifier used by the rejection checks.
    #[must_use]
    pub fn fixed_booking_id(&self) -> BookingId {
        BookingId::from(self.fixed_booking_id)
    }

    /// Checks the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns an error for non-http(s) base URLs, a zero timeout, zero
    /// retry attempts or an unusable credential.
    pub fn validate(&self) -> DomainResult<()> {
        validate_base_url("booking_base_url", &self.booking_base_url)?;
        validate_base_url("posts_base_url", &self.posts_base_url)?;
        if self.timeout_ms == 0 {
            return Err(DomainError::InvalidSettings(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DomainError::InvalidSettings(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        self.credential.credential()?;
        Ok(())
    }
}

fn validate_base_url(field: &str, raw: &str) -> DomainResult<()> {
    let url = Url::parse(raw)
        .map_err(|e| DomainError::InvalidSettings(format!("{field}: {e}: {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DomainError::InvalidSettings(format!(
            "{field}: scheme must be http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(())
}

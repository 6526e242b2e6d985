//! HTTP Basic credential

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// An HTTP Basic credential, stored as its encoded token.
///
/// The token is kept verbatim so deliberately malformed credentials can be
/// sent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Encodes `username:password` as a Basic credential.
    #[must_use]
    pub fn basic(username: &str, password: &str) -> Self {
        Self {
            token: STANDARD.encode(format!("{username}:{password}")),
        }
    }

    /// Wraps an already encoded token without decoding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or contains whitespace.
    pub fn from_token(token: impl Into<String>) -> DomainResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(DomainError::InvalidCredential("empty token".to_string()));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidCredential(
                "token contains whitespace".to_string(),
            ));
        }
        Ok(Self { token })
    }

    /// Returns the encoded token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.token)
    }

    /// Returns a copy whose token is one character short.
    ///
    /// Dropping the last character of a padded token breaks its Base64
    /// padding, which servers must reject.
    #[must_use]
    pub fn truncated(&self) -> Self {
        let mut token = self.token.clone();
        token.pop();
        Self { token }
    }

    /// Decodes the token into `(username, password)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not canonical Base64 or lacks a `:`.
    pub fn decode(&self) -> DomainResult<(String, String)> {
        let bytes = STANDARD
            .decode(&self.token)
            .map_err(|e| DomainError::InvalidCredential(e.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| DomainError::InvalidCredential(e.to_string()))?;
        text.split_once(':')
            .map(|(user, pass)| (user.to_string(), pass.to_string()))
            .ok_or_else(|| DomainError::InvalidCredential("missing ':' separator".to_string()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn basic_encodes_user_and_password() {
        let credential = Credential::basic("admin", "password123");
        assert_eq!(credential.token(), "YWRtaW46cGFzc3dvcmQxMjM=");
        assert_eq!(credential.header_value(), "Basic YWRtaW46cGFzc3dvcmQxMjM=");
        assert_eq!(
            credential.decode().unwrap(),
            ("admin".to_string(), "password123".to_string())
        );
    }

    #[test]
    fn truncated_token_loses_its_padding() {
        let malformed = Credential::basic("admin", "password123").truncated();
        assert_eq!(malformed.token(), "YWRtaW46cGFzc3dvcmQxMjM");
        assert!(malformed.decode().is_err());
    }

    #[test]
    fn from_token_rejects_blank_input() {
        assert!(Credential::from_token("").is_err());
        assert!(Credential::from_token("abc def").is_err());
        assert_eq!(
            Credential::from_token("YWRtaW46cGFzc3dvcmQxMjM=").unwrap().decode().unwrap().0,
            "admin"
        );
    }

    #[test]
    fn debug_output_hides_the_token() {
        let debug = format!("{:?}", Credential::basic("admin", "secret"));
        assert!(!debug.contains("YWRtaW4"));
        assert!(debug.contains("redacted"));
    }
}

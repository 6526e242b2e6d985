//! Booking payload and identifier
//!
//! The record is opaque payload as far as the suite is concerned: it is
//! sent, echoed back, and compared field by field. The identifier is the
//! one piece of state carried from one request into the next.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// Check-in and check-out dates, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDates {
    /// Arrival date.
    pub checkin: NaiveDate,
    /// Departure date.
    pub checkout: NaiveDate,
}

impl BookingDates {
    /// Parses both dates from ISO strings.
    ///
    /// # Errors
    ///
    /// Returns an error if either date is not `YYYY-MM-DD`.
    pub fn parse(checkin: &str, checkout: &str) -> DomainResult<Self> {
        let parse = |raw: &str| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| DomainError::InvalidBody(format!("bad date '{raw}': {e}")))
        };
        Ok(Self {
            checkin: parse(checkin)?,
            checkout: parse(checkout)?,
        })
    }
}

/// A booking as submitted to and returned by the booking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Guest first name.
    pub firstname: String,
    /// Guest last name.
    pub lastname: String,
    /// Total price in whole currency units.
    pub totalprice: i64,
    /// Whether the deposit has been paid.
    pub depositpaid: bool,
    /// Stay dates.
    pub bookingdates: BookingDates,
    /// Comma-delimited extras, e.g. `Breakfast,Lunch`.
    #[serde(default)]
    pub additionalneeds: String,
}

impl BookingRecord {
    /// Creates a record with the given guest and stay, no price and no extras.
    #[must_use]
    pub fn new(firstname: impl Into<String>, lastname: impl Into<String>, dates: BookingDates) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.into(),
            totalprice: 0,
            depositpaid: false,
            bookingdates: dates,
            additionalneeds: String::new(),
        }
    }

    /// Sets the total price.
    #[must_use]
    pub const fn with_total_price(mut self, totalprice: i64) -> Self {
        self.totalprice = totalprice;
        self
    }

    /// Sets the deposit flag.
    #[must_use]
    pub const fn with_deposit_paid(mut self, depositpaid: bool) -> Self {
        self.depositpaid = depositpaid;
        self
    }

    /// Sets the additional needs from a list of extras.
    #[must_use]
    pub fn with_additional_needs<S: AsRef<str>>(mut self, needs: &[S]) -> Self {
        self.additionalneeds = needs
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        self
    }

    /// Serializes the record to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> DomainResult<Value> {
        serde_json::to_value(self).map_err(|e| DomainError::InvalidBody(e.to_string()))
    }

    /// Serializes the record to JSON with one top-level field removed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the field does not exist.
    pub fn to_json_without(&self, field: &str) -> DomainResult<Value> {
        let mut value = self.to_json()?;
        let removed = value
            .as_object_mut()
            .and_then(|map| map.remove(field));
        if removed.is_none() {
            return Err(DomainError::InvalidBody(format!(
                "booking record has no field '{field}'"
            )));
        }
        Ok(value)
    }

    /// Returns the identity fields with their JSON values.
    #[must_use]
    pub fn identity_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("firstname", Value::String(self.firstname.clone())),
            ("lastname", Value::String(self.lastname.clone())),
            ("additionalneeds", Value::String(self.additionalneeds.clone())),
        ]
    }
}

/// Opaque identifier the booking service assigns on creation.
///
/// Stored as text so numeric and string identifiers are threaded unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Name of the identifier field in a create response.
    pub const FIELD: &'static str = "bookingid";

    /// Creates an identifier from its text form.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is blank.
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidIdentifier(
                "booking id is blank".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Reads an identifier from a JSON scalar.
    ///
    /// # Errors
    ///
    /// Returns an error for null, booleans, arrays, objects and blank strings.
    pub fn from_value(value: &Value) -> DomainResult<Self> {
        match value {
            Value::Number(n) => Self::new(n.to_string()),
            Value::String(s) => Self::new(s.clone()),
            other => Err(DomainError::InvalidIdentifier(format!(
                "expected a number or string, got {other}"
            ))),
        }
    }

    /// Extracts the identifier from a create response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body has no usable `bookingid` field.
    pub fn from_create_response(body: &Value) -> DomainResult<Self> {
        body.get(Self::FIELD)
            .ok_or_else(|| {
                DomainError::InvalidIdentifier(format!("response has no '{}' field", Self::FIELD))
            })
            .and_then(Self::from_value)
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for BookingId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

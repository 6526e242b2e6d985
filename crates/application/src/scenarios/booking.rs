//! Booking scenarios
//!
//! The full booking path creates a booking and threads the id the service
//! assigned through every later request. The rejection checks target a
//! fixed, pre-existing booking and need no earlier step.

use apiprobe_domain::request::{RequestSpec, join_path};
use apiprobe_domain::response::ResponseSpec;
use apiprobe_domain::testing::Assertion;
use apiprobe_domain::{BookingDates, BookingId, BookingRecord, DomainResult, SuiteSettings};
use serde_json::Value;

use super::schemas;
use crate::workflow::{Capture, Step, Workflow, WorkflowContext, WorkflowError};

/// Scenario name of the create → read → update chain.
pub const FULL_BOOKING_PATH: &str = "Full booking path";
/// Scenario name of the rejected update checks.
pub const UPDATE_REJECTIONS: &str = "Update booking rejections";
/// Scenario name of the standalone create check.
pub const CREATE_BOOKING: &str = "Create booking";

/// Context key holding the created booking's id.
pub const BOOKING_ID_KEY: &str = BookingId::FIELD;

/// Prefix of the context keys holding fields of the first read after the update.
const READ_BACK_PREFIX: &str = "read_back";

/// The booking submitted at creation.
///
/// # Errors
///
/// Never in practice; dates are parsed from constants.
pub fn original_booking() -> DomainResult<BookingRecord> {
    Ok(BookingRecord::new("Julia", "Brown", BookingDates::parse("2020-01-01", "2021-01-01")?)
        .with_total_price(567)
        .with_deposit_paid(true)
        .with_additional_needs(&["Breakfast", "Lunch"]))
}

/// The full replacement sent by the authorized update.
///
/// # Errors
///
/// Never in practice; dates are parsed from constants.
pub fn updated_booking() -> DomainResult<BookingRecord> {
    Ok(BookingRecord::new("JuliaUpdate", "Browns", BookingDates::parse("2020-01-01", "2021-01-01")?)
        .with_total_price(567)
        .with_deposit_paid(true)
        .with_additional_needs(&["Breakfast", "Dinner"]))
}

/// The replacement sent with a malformed credential.
///
/// # Errors
///
/// Never in practice; dates are parsed from constants.
pub fn unauthorized_booking() -> DomainResult<BookingRecord> {
    Ok(BookingRecord::new("Julia", "Browns", BookingDates::parse("2020-01-01", "2021-01-01")?)
        .with_total_price(567)
        .with_deposit_paid(true)
        .with_additional_needs(&["Breakfast", "Lunch"]))
}

/// A replacement missing its required `firstname`.
///
/// # Errors
///
/// Never in practice; the record always has a `firstname` to remove.
pub fn incomplete_booking() -> DomainResult<Value> {
    BookingRecord::new("Harry", "Potting", BookingDates::parse("2018-01-01", "2019-01-01")?)
        .with_total_price(111)
        .with_deposit_paid(true)
        .with_additional_needs(&["Breakfast"])
        .to_json_without("firstname")
}

fn booking_id_capture() -> Capture {
    Capture::new(BOOKING_ID_KEY, "$.bookingid", |response: &ResponseSpec| {
        let body = response.body_as_json().map_err(|e| WorkflowError::Capture {
            key: BOOKING_ID_KEY.to_string(),
            reason: format!("body is not JSON: {e}"),
        })?;
        let id = BookingId::from_create_response(&body).map_err(|e| WorkflowError::Capture {
            key: BOOKING_ID_KEY.to_string(),
            reason: e.to_string(),
        })?;
        Ok(id.to_string())
    })
}

fn read_back_key(field: &str) -> String {
    format!("{READ_BACK_PREFIX}.{field}")
}

/// Stores the JSON text of one top-level response field.
fn field_capture(field: &'static str) -> Capture {
    let key = read_back_key(field);
    Capture::new(key.clone(), format!("$.{field}"), move |response: &ResponseSpec| {
        let body = response.body_as_json().map_err(|e| WorkflowError::Capture {
            key: key.clone(),
            reason: format!("body is not JSON: {e}"),
        })?;
        body.get(field)
            .map(Value::to_string)
            .ok_or_else(|| WorkflowError::Capture {
                key: key.clone(),
                reason: format!("no '{field}' in body"),
            })
    })
}

/// Expects each field to equal the value captured by [`field_capture`].
fn read_back_checks(
    ctx: &WorkflowContext,
    fields: &[&'static str],
) -> Result<Vec<Assertion>, WorkflowError> {
    fields
        .iter()
        .map(|field| {
            let key = read_back_key(field);
            let value = serde_json::from_str(ctx.require(&key)?)
                .map_err(|e| WorkflowError::Capture { key, reason: e.to_string() })?;
            Ok(Assertion::json_equals(format!("$.{field}"), value))
        })
        .collect()
}

fn booking_url(base: &str, id: &BookingId) -> DomainResult<String> {
    join_path(base, &["booking", id.as_str()])
}

fn captured_booking_url(base: &str, ctx: &WorkflowContext) -> Result<String, WorkflowError> {
    let id = BookingId::new(ctx.require(BOOKING_ID_KEY)?)?;
    Ok(booking_url(base, &id)?)
}

fn identity_checks(record: &BookingRecord) -> Vec<Assertion> {
    record
        .identity_values()
        .into_iter()
        .map(|(field, value)| Assertion::json_equals(format!("$.{field}"), value))
        .collect()
}

fn get_step(name: &'static str, base: &str) -> Step {
    let base = base.to_string();
    Step::new(name, move |ctx| {
        Ok(RequestSpec::get(name, captured_booking_url(&base, ctx)?)
            .with_header("Accept", "application/json"))
    })
    .expect(Assertion::status(200))
}

fn read_step(name: &'static str, base: &str, expected: &BookingRecord) -> Step {
    get_step(name, base).expect_all(identity_checks(expected))
}

/// Create → read → update → read → read, threading the created id.
///
/// The first read after the update checks the update is visible and
/// captures the identity fields; the repeat read must return those same
/// captured values, so reads with no write in between agree.
///
/// # Errors
///
/// Returns an error if the base URL or credential settings are unusable.
pub fn full_booking_path(settings: &SuiteSettings) -> DomainResult<Workflow> {
    let credential = settings.credential.credential()?;
    let original = original_booking()?;
    let updated = updated_booking()?;
    let base = settings.booking_base_url.clone();

    let create = RequestSpec::post("Create booking", join_path(&base, &["booking"])?)
        .with_header("Accept", "application/json")
        .with_json(&original.to_json()?);

    let fields: Vec<&'static str> = updated
        .identity_values()
        .into_iter()
        .map(|(field, _)| field)
        .collect();
    let read_back = fields.iter().fold(
        read_step("Read updated booking", &base, &updated),
        |step, field| step.capture(field_capture(*field)),
    );
    let repeat_read = get_step("Read updated booking again", &base)
        .expect_derived(move |ctx| read_back_checks(ctx, &fields));

    let update_body = updated.to_json()?;
    let update_base = base.clone();
    let update = Step::new("Update booking", move |ctx| {
        Ok(RequestSpec::put("Update booking", captured_booking_url(&update_base, ctx)?)
            .with_header("Accept", "application/json")
            .with_json(&update_body)
            .with_credential(&credential))
    })
    .expect(Assertion::status(200))
    .expect(Assertion::schema("booking", schemas::booking_record()))
    .expect_all(identity_checks(&updated));

    Ok(Workflow::new(FULL_BOOKING_PATH)
        .step(
            Step::fixed(create)
                .expect(Assertion::status(200))
                .expect(Assertion::schema("booking created", schemas::booking_created()))
                .capture(booking_id_capture()),
        )
        .step(read_step("Read booking", &base, &original))
        .step(update)
        .step(read_back)
        .step(repeat_read))
}

/// Updates of a fixed booking that the service must refuse.
///
/// # Errors
///
/// Returns an error if the base URL or credential settings are unusable.
pub fn update_rejections(settings: &SuiteSettings) -> DomainResult<Workflow> {
    let credential = settings.credential.credential()?;
    let url = booking_url(&settings.booking_base_url, &settings.fixed_booking_id())?;

    let forbidden = RequestSpec::put("Update with malformed credential", url.clone())
        .with_header("Accept", "application/json")
        .with_json(&unauthorized_booking()?.to_json()?)
        .with_credential(&credential.truncated());

    let bad_request = RequestSpec::put("Update with incomplete record", url)
        .with_header("Accept", "application/json")
        .with_json(&incomplete_booking()?)
        .with_credential(&credential);

    Ok(Workflow::new(UPDATE_REJECTIONS)
        .step(
            Step::fixed(forbidden)
                .expect(Assertion::status(403))
                .expect(Assertion::body_equals("Forbidden")),
        )
        .step(
            Step::fixed(bad_request)
                .expect(Assertion::status(400))
                .expect(Assertion::body_equals("Bad Request")),
        ))
}

/// A standalone creation whose response must match the booking schema.
///
/// # Errors
///
/// Returns an error if the base URL is unusable.
pub fn create_booking(settings: &SuiteSettings) -> DomainResult<Workflow> {
    let request = RequestSpec::post(
        "Create booking",
        join_path(&settings.booking_base_url, &["booking"])?,
    )
    .with_header("Accept", "application/json")
    .with_json(&original_booking()?.to_json()?);

    Ok(Workflow::new(CREATE_BOOKING).step(
        Step::fixed(request).expect(Assertion::schema("booking created", schemas::booking_created())),
    ))
}

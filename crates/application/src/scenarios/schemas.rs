//! JSON Schemas for response bodies.

use serde_json::{Value, json};

/// Schema of a booking record as returned by the booking service.
#[must_use]
pub fn booking_record() -> Value {
    json!({
        "type": "object",
        "required": [
            "firstname",
            "lastname",
            "totalprice",
            "depositpaid",
            "bookingdates"
        ],
        "properties": {
            "firstname": {"type": "string"},
            "lastname": {"type": "string"},
            "totalprice": {"type": "integer"},
            "depositpaid": {"type": "boolean"},
            "bookingdates": {
                "type": "object",
                "required": ["checkin", "checkout"],
                "properties": {
                    "checkin": {"type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}$"},
                    "checkout": {"type": "string", "pattern": "^\\d{4}-\\d{2}-\\d{2}$"}
                }
            },
            "additionalneeds": {"type": "string"}
        }
    })
}

/// Schema of the create response: the assigned id plus the stored record.
#[must_use]
pub fn booking_created() -> Value {
    json!({
        "type": "object",
        "required": ["bookingid", "booking"],
        "properties": {
            "bookingid": {"type": ["integer", "string"]},
            "booking": booking_record()
        }
    })
}

/// Schema of the posts collection.
#[must_use]
pub fn posts_collection() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["userId", "id", "title", "body"],
            "properties": {
                "userId": {"type": "integer"},
                "id": {"type": "integer"},
                "title": {"type": "string"},
                "body": {"type": "string"}
            }
        }
    })
}

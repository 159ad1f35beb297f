use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// A single timestamped position, as submitted by a tracker.
///
/// Coordinates keep the submitted JSON number, so `52` is written back as `52` and not as `52.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub timestamp: String,
    pub latitude: Number,
    pub longitude: Number,
}

impl LocationRecord {
    #[cfg(test)]
    pub fn new(timestamp: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        LocationRecord {
            timestamp: timestamp.into(),
            latitude: Number::from_f64(latitude).unwrap(),
            longitude: Number::from_f64(longitude).unwrap(),
        }
    }

    /// Validates a decoded request payload. Payloads that are not objects fail on the missing timestamp.
    pub fn from_payload(payload: &Value) -> Result<Self, InvalidPayload> {
        let timestamp = match payload.get("timestamp") {
            Some(Value::String(timestamp)) if !timestamp.is_empty() => timestamp.clone(),
            Some(Value::String(_)) | Some(Value::Null) | None => return Err(InvalidPayload::MissingTimestamp),
            Some(other) => return Err(InvalidPayload::TimestampNotAString(json_type(other))),
        };

        let latitude = number_field(payload, "latitude")?;
        let longitude = number_field(payload, "longitude")?;

        Ok(LocationRecord {
            timestamp,
            latitude,
            longitude,
        })
    }
}

fn number_field(payload: &Value, field: &'static str) -> Result<Number, InvalidPayload> {
    match payload.get(field) {
        Some(Value::Number(number)) => Ok(number.clone()),
        Some(other) => Err(InvalidPayload::NotANumber {
            field,
            found: json_type(other),
        }),
        None => Err(InvalidPayload::NotANumber { field, found: "nothing" }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidPayload {
    #[error("timestamp is missing or empty")]
    MissingTimestamp,
    #[error("timestamp must be a string, found {0}")]
    TimestampNotAString(&'static str),
    #[error("{field} must be a number, found {found}")]
    NotANumber { field: &'static str, found: &'static str },
}

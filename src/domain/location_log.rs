use crate::domain::LocationRecord;
use serde_json::Value;
use thiserror::Error;

/// The append-only history of location records, stored as one JSON array.
///
/// Entries read from storage are kept as raw JSON values so that a rewrite reproduces them exactly,
/// including fields and key order this service does not know about.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationLog {
    entries: Vec<Value>,
}

impl LocationLog {
    pub fn new() -> Self {
        LocationLog::default()
    }

    /// Decodes a stored document. Valid JSON that is not an array is reported as [`LocationLogError::NotAnArray`]
    /// so the caller can decide to start over with an empty log.
    pub fn from_json(content: &[u8]) -> Result<Self, LocationLogError> {
        match serde_json::from_slice::<Value>(content)? {
            Value::Array(entries) => Ok(LocationLog { entries }),
            Value::Null => Err(LocationLogError::NotAnArray("null")),
            Value::Bool(_) => Err(LocationLogError::NotAnArray("boolean")),
            Value::Number(_) => Err(LocationLogError::NotAnArray("number")),
            Value::String(_) => Err(LocationLogError::NotAnArray("string")),
            Value::Object(_) => Err(LocationLogError::NotAnArray("object")),
        }
    }

    pub fn push(&mut self, record: &LocationRecord) -> Result<(), LocationLogError> {
        self.entries.push(serde_json::to_value(record).map_err(LocationLogError::Encode)?);
        Ok(())
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pretty-printed with two-space indentation, the layout existing documents use.
    pub fn to_json(&self) -> Result<Vec<u8>, LocationLogError> {
        serde_json::to_vec_pretty(&self.entries).map_err(LocationLogError::Encode)
    }
}

#[derive(Error, Debug)]
pub enum LocationLogError {
    #[error("document is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("document is a JSON {0}, expected an array")]
    NotAnArray(&'static str),
    #[error("unable to encode the location log: {0}")]
    Encode(#[source] serde_json::Error),
}

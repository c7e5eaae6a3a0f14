//! Structural validation of status payloads
//!
//! Only the envelope is checked here. Individual records are validated when
//! they are formatted, so one malformed record does not hide the others.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Payload key holding the list of status records
pub const HOMEWORKS_KEY: &str = "homeworks";
/// Payload key holding the server timestamp for the next cursor
pub const CURRENT_DATE_KEY: &str = "current_date";

/// One reviewed submission as returned by the server
///
/// The original JSON is kept as-is, so metadata such as `reviewer_comment`,
/// `date_updated` or `lesson_name` round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusRecord(Value);

impl StatusRecord {
    /// Wrap a raw JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Get a field, if present; `null` counts as present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Submission name (`homework_name`)
    pub fn homework_name(&self) -> Option<&Value> {
        self.field("homework_name")
    }

    /// Review status (`status`)
    pub fn status(&self) -> Option<&Value> {
        self.field("status")
    }

    /// Borrow the raw JSON value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the raw JSON value
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for StatusRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Extract the ordered status records from a decoded payload
///
/// # Errors
///
/// - [`Error::WrongShape`] if the payload is not an object
/// - [`Error::MissingKey`] if `homeworks` is absent
/// - [`Error::WrongShape`] if `homeworks` is not an array
///
/// An empty `homeworks` array is valid and yields no records.
pub fn extract_records(response: &Value) -> Result<Vec<StatusRecord>> {
    let object = response.as_object().ok_or_else(|| {
        Error::wrong_shape(format!(
            "Ожидался объект, получено: {}",
            json_type_name(response)
        ))
    })?;

    let homeworks = object
        .get(HOMEWORKS_KEY)
        .ok_or_else(|| Error::missing_key(HOMEWORKS_KEY))?;

    let records = homeworks.as_array().ok_or_else(|| {
        Error::wrong_shape(format!(
            "Компонент {} должен быть списком, получено: {}",
            HOMEWORKS_KEY,
            json_type_name(homeworks)
        ))
    })?;

    Ok(records.iter().cloned().map(StatusRecord::from).collect())
}

/// Read the server-supplied cursor, if present and an integer
pub fn current_date(response: &Value) -> Option<i64> {
    response.get(CURRENT_DATE_KEY).and_then(Value::as_i64)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

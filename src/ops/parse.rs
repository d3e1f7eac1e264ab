//! JSON text parsing with descriptive failures.

use serde_json::Value;

use super::OpError;

/// Parse JSON text into a value.
///
/// Empty or whitespace-only input is rejected rather than silently coerced.
/// Input that is not a string passes through unchanged, so callers can feed
/// already-structured data without special-casing.
pub fn parse(input: &Value) -> Result<Value, OpError> {
    let text = match input {
        Value::String(text) => text,
        other => return Ok(other.clone()),
    };

    if text.trim().is_empty() {
        return Err(OpError::EmptyInput);
    }

    serde_json::from_str(text).map_err(OpError::InvalidJson)
}

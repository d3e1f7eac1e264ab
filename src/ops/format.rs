//! JSON pretty-printing.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

use super::OpError;
use crate::config::FormatSettings;

/// Pretty-print a JSON value with the configured indent width.
///
/// The output parses back to a value deep-equal to the input.
pub fn stringify(value: &Value, format: &FormatSettings) -> Result<String, OpError> {
    let indent = vec![b' '; format.indent];
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(&indent);
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(OpError::StringifyFailed)?;
    // The serializer only emits UTF-8.
    Ok(String::from_utf8(out).expect("pretty printer produced invalid UTF-8"))
}

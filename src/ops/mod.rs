//! Operation handlers shared by the worker process and the local fallback.
//!
//! Both execution paths dispatch through [`execute`], so the fallback cannot
//! drift from the worker's behavior: a caller sees the same result for the
//! same operation regardless of which path served it.

mod diff;
mod format;
mod parse;

pub use diff::{deep_equal, diff, DiffOp, DiffReport};
pub use format::stringify;
pub use parse::parse;

use serde_json::Value;
use thiserror::Error;

use crate::config::FormatSettings;
use crate::worker::protocol::{codes, Op};

/// Errors produced by operation handlers.
#[derive(Debug, Error)]
pub enum OpError {
    /// Input text was empty or whitespace.
    #[error("cannot parse empty input")]
    EmptyInput,

    /// Input text was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Value could not be serialized to JSON text.
    #[error("failed to serialize value: {0}")]
    StringifyFailed(#[source] serde_json::Error),
}

impl OpError {
    /// Wire error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            OpError::EmptyInput => codes::EMPTY_INPUT,
            OpError::InvalidJson(_) => codes::INVALID_JSON,
            OpError::StringifyFailed(_) => codes::STRINGIFY_FAILED,
        }
    }
}

/// Execute an operation against the local handler table.
///
/// Results are wire-shaped [`Value`]s: a JSON string for `stringify`, the
/// parsed document for `parse`, and a [`DiffReport`] (or `null` for
/// identical inputs) for `diff`.
pub fn execute(op: &Op, format: &FormatSettings) -> Result<Value, OpError> {
    match op {
        Op::Stringify { value } => Ok(Value::String(stringify(value, format)?)),
        Op::Parse { input } => parse(input),
        Op::Diff {
            baseline,
            candidate,
        } => match diff(baseline, candidate) {
            Some(report) => serde_json::to_value(report).map_err(OpError::StringifyFailed),
            None => Ok(Value::Null),
        },
    }
}

//! Wire protocol for worker communication.
//!
//! One JSON object per line in each direction (NDJSON). Requests carry a
//! correlation id generated by the client; responses echo it back, so the
//! worker may answer in any order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single operation the worker knows how to execute.
///
/// The set is closed: both the worker serve loop and the in-process fallback
/// dispatch by exhaustive match, so an unsupported operation is a compile
/// error rather than a runtime failure on an unknown name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "params", rename_all = "snake_case")]
pub enum Op {
    /// Pretty-print a JSON value to text.
    Stringify { value: Value },

    /// Parse JSON text into a value. Non-string input passes through
    /// unchanged.
    Parse { input: Value },

    /// Structural diff of two JSON values. The result is `null` when the
    /// values are identical.
    Diff { baseline: Value, candidate: Value },
}

impl Op {
    /// Operation name as it appears on the wire (used in error messages).
    pub fn name(&self) -> &'static str {
        match self {
            Op::Stringify { .. } => "stringify",
            Op::Parse { .. } => "parse",
            Op::Diff { .. } => "diff",
        }
    }
}

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,

    /// The operation to execute.
    #[serde(flatten)]
    pub op: Op,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,

    /// Whether the request succeeded.
    pub success: bool,

    /// Result data (present if success = true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error information (present if success = false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ResponseEnvelope {
    /// Build a success response.
    pub fn success(id: String, result: Value) -> Self {
        Self {
            id,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Build a failure response.
    pub fn failure(id: String, code: &str, message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }
}

/// Error information in a failed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Error codes the worker can report.
pub mod codes {
    pub const EMPTY_INPUT: &str = "EMPTY_INPUT";
    pub const INVALID_JSON: &str = "INVALID_JSON";
    pub const STRINGIFY_FAILED: &str = "STRINGIFY_FAILED";
    pub const WORKER_EXITED: &str = "WORKER_EXITED";
}

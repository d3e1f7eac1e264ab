//! Worker-specific error types.

use std::io;
use thiserror::Error;

use crate::ops::OpError;

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that can occur while executing an operation.
///
/// Operation failures (`EmptyInput`, `InvalidJson`, `StringifyFailed`) look
/// the same whether the operation ran in the worker process or in the local
/// fallback; everything else is specific to worker communication.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Failed to spawn the worker process.
    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(#[source] io::Error),

    /// No worker binary could be located.
    #[error("worker binary not found; set worker.path in scriv.toml or SCRIV_WORKER")]
    WorkerNotFound,

    /// Failed to write to worker stdin.
    #[error("failed to write to worker: {0}")]
    WriteFailed(#[source] io::Error),

    /// Failed to serialize a request to JSON.
    #[error("failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// Failed to deserialize a response payload.
    #[error("failed to deserialize response: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// Request timed out waiting for a response.
    #[error("{op} request timed out after {ms} ms")]
    Timeout { op: &'static str, ms: u64 },

    /// Worker process exited while requests were in flight.
    #[error("worker process exited unexpectedly")]
    WorkerExited,

    /// Response channel was closed (internal error).
    #[error("response channel closed unexpectedly")]
    ChannelClosed,

    /// Parse rejected empty input.
    #[error("parse failed: {0}")]
    EmptyInput(String),

    /// Parse rejected malformed JSON.
    #[error("parse failed: {0}")]
    InvalidJson(String),

    /// Stringify could not serialize the value.
    #[error("stringify failed: {0}")]
    StringifyFailed(String),

    /// Worker returned an unclassified error response.
    #[error("worker error: {message} (code: {code})")]
    Remote {
        /// Error code from worker.
        code: String,
        /// Error message from worker.
        message: String,
    },
}

impl WorkerError {
    /// Create a remote error from an error response.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Check if this error indicates the worker itself is unusable, as
    /// opposed to a single operation failing.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::SpawnFailed(_)
                | Self::WorkerNotFound
                | Self::WriteFailed(_)
                | Self::WorkerExited
                | Self::ChannelClosed
        )
    }
}

impl From<OpError> for WorkerError {
    fn from(err: OpError) -> Self {
        let message = err.to_string();
        match err {
            OpError::EmptyInput => Self::EmptyInput(message),
            OpError::InvalidJson(_) => Self::InvalidJson(message),
            OpError::StringifyFailed(_) => Self::StringifyFailed(message),
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for WorkerError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}

//! Preview rendering pipeline.
//!
//! Turns raw document data into a formatted string on an output surface.
//! The buffer is snapshotted on entry and either replaced wholesale with
//! the fully formatted result or restored untouched; a partially rendered
//! preview is never visible. All state is local to one call, so concurrent
//! renders against different targets are independent; against the same
//! target the last successful render wins.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::surface::{PreviewTarget, Status};
use crate::config::FormatSettings;
use crate::ops;
use crate::worker::{WorkerClient, WorkerError};

/// Error raised by a caller-supplied transform.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that can occur while rendering a preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// A build/auto-fix/validate transform rejected the payload.
    #[error("{0}")]
    Transform(#[from] TransformError),

    /// The payload could not be formatted.
    #[error(transparent)]
    Format(#[from] WorkerError),
}

/// Status text for the indicator: fixed, or derived from the final payload.
pub enum StatusMessage {
    Text(String),
    FromPayload(Box<dyn Fn(&Value) -> String + Send + Sync>),
}

impl StatusMessage {
    fn resolve(&self, payload: &Value) -> String {
        match self {
            StatusMessage::Text(text) => text.clone(),
            StatusMessage::FromPayload(f) => f(payload),
        }
    }
}

impl From<&str> for StatusMessage {
    fn from(text: &str) -> Self {
        StatusMessage::Text(text.to_string())
    }
}

impl From<String> for StatusMessage {
    fn from(text: String) -> Self {
        StatusMessage::Text(text)
    }
}

type BuildFn = dyn Fn(&Value) -> Result<Value, TransformError> + Send + Sync;
type FixFn = dyn Fn(&mut Value) -> Result<Option<Value>, TransformError> + Send + Sync;

/// One preview render call.
///
/// `data` is borrowed; the pipeline clones it before running transforms, so
/// auto-fix and validation can never reach back into the caller's value.
pub struct PreviewRequest<'a> {
    data: &'a Value,
    build_payload: Option<Box<BuildFn>>,
    auto_fix: Option<Box<FixFn>>,
    validator: Option<Box<FixFn>>,
    success_message: Option<StatusMessage>,
    error_message: Option<StatusMessage>,
}

impl<'a> PreviewRequest<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self {
            data,
            build_payload: None,
            auto_fix: None,
            validator: None,
            success_message: None,
            error_message: None,
        }
    }

    /// Derive the candidate payload from `data` instead of using it as-is.
    pub fn build_payload<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.build_payload = Some(Box::new(f));
        self
    }

    /// Corrective transform applied before validation.
    ///
    /// May mutate the candidate in place, or return a replacement;
    /// returning `Ok(None)` keeps the (possibly mutated) candidate.
    pub fn auto_fix<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Value) -> Result<Option<Value>, TransformError> + Send + Sync + 'static,
    {
        self.auto_fix = Some(Box::new(f));
        self
    }

    /// Final gate before formatting. Same calling convention as
    /// [`auto_fix`](Self::auto_fix): assert, mutate, or replace.
    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Value) -> Result<Option<Value>, TransformError> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(f));
        self
    }

    /// Status message applied on success.
    pub fn success_message(mut self, message: impl Into<StatusMessage>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// Status message applied when a failure has no message of its own.
    pub fn error_message(mut self, message: impl Into<StatusMessage>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Result of [`render_preview`].
#[derive(Debug)]
pub enum RenderOutcome {
    /// The buffer now holds the formatted payload.
    Rendered {
        /// Final payload after the transform chain.
        payload: Value,
    },

    /// No output surface was supplied; nothing happened.
    NoTarget,

    /// A transform or the formatter failed; the buffer is untouched.
    Failed { error: PreviewError },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            RenderOutcome::Rendered { payload } => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PreviewError> {
        match self {
            RenderOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Render a preview onto `target`.
///
/// The formatting step goes through `client` when one is supplied;
/// otherwise it runs in-process with default formatting. On success the
/// buffer is rewritten only if the formatted text actually changed; on any
/// failure the buffer is restored to its entry snapshot and the indicator
/// (if any) shows an error status.
pub async fn render_preview(
    request: PreviewRequest<'_>,
    target: Option<PreviewTarget<'_>>,
    client: Option<&WorkerClient>,
) -> RenderOutcome {
    let Some(mut target) = target else {
        return RenderOutcome::NoTarget;
    };

    let snapshot = target.buffer.text();

    match run_chain(&request, client).await {
        Ok((payload, formatted)) => {
            if target.buffer.text() != formatted {
                target.buffer.set_text(&formatted);
            } else {
                debug!("preview unchanged, skipping buffer write");
            }

            if let Some(indicator) = target.indicator.as_mut() {
                let message = request
                    .success_message
                    .as_ref()
                    .map(|m| m.resolve(&payload))
                    .unwrap_or_else(|| "Preview updated".to_string());
                indicator.set_status(Status::success(message));
            }

            RenderOutcome::Rendered { payload }
        }
        Err(error) => {
            // Restore the snapshot; a no-op unless something already wrote.
            if target.buffer.text() != snapshot {
                target.buffer.set_text(&snapshot);
            }

            if let Some(indicator) = target.indicator.as_mut() {
                let mut message = error.to_string();
                if message.is_empty() {
                    message = request
                        .error_message
                        .as_ref()
                        .map(|m| m.resolve(request.data))
                        .unwrap_or_else(|| "Preview failed".to_string());
                }
                indicator.set_status(Status::error(message));
            }

            RenderOutcome::Failed { error }
        }
    }
}

/// Build → clone → auto-fix → validate → format.
async fn run_chain(
    request: &PreviewRequest<'_>,
    client: Option<&WorkerClient>,
) -> Result<(Value, String), PreviewError> {
    let mut candidate = match &request.build_payload {
        Some(build) => build(request.data)?,
        None => request.data.clone(),
    };

    if let Some(fix) = &request.auto_fix {
        if let Some(replacement) = fix(&mut candidate)? {
            candidate = replacement;
        }
    }

    if let Some(validate) = &request.validator {
        if let Some(replacement) = validate(&mut candidate)? {
            candidate = replacement;
        }
    }

    let formatted = match client {
        Some(client) => client.stringify(&candidate).await?,
        None => {
            ops::stringify(&candidate, &FormatSettings::default()).map_err(WorkerError::from)?
        }
    };

    Ok((candidate, formatted))
}

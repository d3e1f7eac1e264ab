//! Preview rendering on top of the worker client.

mod pipeline;
mod surface;

pub use pipeline::{
    render_preview, PreviewError, PreviewRequest, RenderOutcome, StatusMessage, TransformError,
};
pub use surface::{PreviewTarget, Status, StatusIndicator, StatusKind, TextBuffer};

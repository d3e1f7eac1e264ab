//! Output surface for preview rendering.
//!
//! The pipeline owns neither the text buffer nor the status indicator; the
//! surrounding UI layer supplies both and decides how a status turns into
//! markup or iconography.

/// Severity of a preview status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Warning,
    Error,
}

/// A status update for the indicator next to a preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

/// A readable, replaceable text buffer.
///
/// The pipeline reads the buffer once on entry and only ever replaces its
/// contents wholesale; it never writes a partial rendering.
pub trait TextBuffer {
    /// Current contents.
    fn text(&self) -> String;

    /// Replace the contents.
    fn set_text(&mut self, text: &str);
}

impl TextBuffer for String {
    fn text(&self) -> String {
        self.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.clear();
        self.push_str(text);
    }
}

/// Receives status updates alongside the text buffer.
pub trait StatusIndicator {
    fn set_status(&mut self, status: Status);
}

/// Keeps only the most recent status. Handy as a recording indicator in
/// tests and headless callers.
impl StatusIndicator for Option<Status> {
    fn set_status(&mut self, status: Status) {
        *self = Some(status);
    }
}

/// Where a rendered preview lands.
pub struct PreviewTarget<'a> {
    pub buffer: &'a mut dyn TextBuffer,
    pub indicator: Option<&'a mut dyn StatusIndicator>,
}

impl<'a> PreviewTarget<'a> {
    /// Target a buffer with no status indicator.
    pub fn new(buffer: &'a mut dyn TextBuffer) -> Self {
        Self {
            buffer,
            indicator: None,
        }
    }

    /// Target a buffer and a status indicator.
    pub fn with_indicator(
        buffer: &'a mut dyn TextBuffer,
        indicator: &'a mut dyn StatusIndicator,
    ) -> Self {
        Self {
            buffer,
            indicator: Some(indicator),
        }
    }
}

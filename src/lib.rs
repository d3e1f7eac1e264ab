//! # Scriv
//!
//! Asynchronous JSON offload pipeline for interactive content authoring.
//!
//! Scriv moves CPU-bound JSON work (pretty-printing, diffing) off the
//! caller's thread onto a worker child process, and layers a preview
//! rendering pipeline on top that updates a visible output surface
//! atomically: the surface is either replaced with a fully formatted result
//! or left exactly as it was.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Caller (UI layer)                     │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼ [preview]
//! ┌──────────────────────────────────────────────────────────┐
//! │  Preview Pipeline (build → clone → auto-fix → validate)  │
//! │  snapshot / commit / rollback of the output surface      │
//! └──────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼ [worker]
//! ┌──────────────────────────────────────────────────────────┐
//! │  WorkerClient — correlation ids, per-request timeouts,   │
//! │  failure latch, transparent in-process fallback          │
//! └──────────────────────────────────────────────────────────┘
//!                 │                           │
//!        NDJSON   ▼                           ▼ [ops]
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  scriv-worker (child)    │   │  local handler table     │
//! │  same handler table ─────┼───┼──► ops::execute          │
//! └──────────────────────────┘   └──────────────────────────┘
//! ```

pub mod config;
pub mod ops;
pub mod preview;
pub mod worker;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{FormatSettings, Settings, WorkerSettings};
    pub use crate::ops::{DiffOp, DiffReport};
    pub use crate::preview::{
        render_preview, PreviewError, PreviewRequest, PreviewTarget, RenderOutcome, Status,
        StatusKind, TextBuffer, TransformError,
    };
    pub use crate::worker::{WorkerClient, WorkerError, WorkerResult};
}

// Also export the client at crate root for convenience
pub use worker::{shared, WorkerClient};

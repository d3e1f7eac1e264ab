//! Worker communication module.
//!
//! Offloads CPU-bound JSON operations (pretty-printing, diffing) to a
//! worker child process so large documents never block the caller's thread.
//! The worker speaks NDJSON over stdin/stdout; every request carries a
//! unique id so concurrent requests correlate with their responses
//! regardless of completion order. When no worker can be spawned, or a
//! previous worker failed, the same operations execute in-process with
//! identical semantics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Application (Rust + Tokio)                  │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                    WorkerClient (Async)                   │  │
//! │  │  - Lazily spawns scriv-worker as a child process          │  │
//! │  │  - NDJSON protocol over stdin/stdout                      │  │
//! │  │  - Request IDs for concurrent request correlation         │  │
//! │  │  - Permanent in-process fallback after worker failure     │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                              │                                  │
//! │               stdin (NDJSON) │ stdout (NDJSON)                  │
//! │                              ▼                                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            scriv-worker (Long-Running Child Process)            │
//! │            executes the same handler table as the fallback      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use scriv::config::Settings;
//! use scriv::worker::WorkerClient;
//!
//! let client = WorkerClient::new(&Settings::load()?);
//!
//! let text = client.stringify(&serde_json::json!({"a": 1})).await?;
//! assert_eq!(text, "{\n  \"a\": 1\n}");
//!
//! // The worker is killed when the client is dropped.
//! ```

mod client;
mod error;
pub mod protocol;
pub mod service;

pub use client::{WorkerClient, DEFAULT_TIMEOUT_MS};
pub use error::{WorkerError, WorkerResult};

use once_cell::sync::Lazy;

use crate::config::Settings;

static SHARED: Lazy<WorkerClient> =
    Lazy::new(|| WorkerClient::new(&Settings::load().unwrap_or_default()));

/// Process-wide default client, built from [`Settings::load`] on first use.
///
/// Convenience for callers that do not manage their own instance; anything
/// needing isolation (tests, embedders) should construct a [`WorkerClient`]
/// directly.
pub fn shared() -> &'static WorkerClient {
    &SHARED
}

//! Async client for the JSON offload worker.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use super::error::{WorkerError, WorkerResult};
use super::protocol::{codes, ErrorInfo, Op, RequestEnvelope, ResponseEnvelope};
use crate::config::{FormatSettings, Settings, WorkerSettings};
use crate::ops::{self, DiffReport};

/// Default timeout for requests (7 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 7_000;

/// Map of pending request IDs to response channels.
type PendingMap = HashMap<String, oneshot::Sender<ResponseEnvelope>>;

/// Handle to a live worker process.
struct WorkerHandle {
    /// Writer for sending requests to worker stdin.
    stdin: BufWriter<ChildStdin>,

    /// The worker child process (killed on drop).
    child: Child,

    /// Background task reading responses from worker stdout.
    reader: tokio::task::JoinHandle<()>,
}

/// State shared between the client and the background reader task.
struct Shared {
    /// Pending-response table, keyed by request id. Entries leave exactly
    /// once: matching response, timeout, or the bulk flush when the worker
    /// dies — whichever happens first; the other paths find nothing to do.
    pending: Mutex<PendingMap>,

    /// One-way latch. Once the worker is deemed unusable the client never
    /// spawns or talks to a worker again; every operation runs in-process.
    unavailable: AtomicBool,

    /// Lazily spawned worker, created by the first request that needs it.
    conn: Mutex<Option<WorkerHandle>>,
}

/// Async client for the JSON offload worker.
///
/// Operations are dispatched to a `scriv-worker` child process as NDJSON
/// over stdin/stdout. Each request carries a unique id for correlation with
/// its response, so concurrent requests complete independently and in any
/// order. When no worker can be spawned, or a previous worker failed, the
/// same operations execute in-process against the same handler table;
/// callers see identical semantics either way.
///
/// Construct one per application (or per test) and share it by reference;
/// [`crate::worker::shared`] provides a process-wide default instance.
///
/// # Example
///
/// ```ignore
/// use scriv::config::Settings;
/// use scriv::worker::WorkerClient;
///
/// let client = WorkerClient::new(&Settings::load()?);
/// let text = client.stringify(&serde_json::json!({"a": 1})).await?;
/// ```
pub struct WorkerClient {
    settings: WorkerSettings,
    format: FormatSettings,
    shared: Arc<Shared>,
    default_timeout: Duration,
}

impl WorkerClient {
    /// Create a client from settings.
    ///
    /// The worker process is spawned lazily by the first request that needs
    /// it; construction never fails.
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.worker.clone(),
            format: settings.format.clone(),
            shared: Arc::new(Shared {
                pending: Mutex::new(HashMap::new()),
                unavailable: AtomicBool::new(false),
                conn: Mutex::new(None),
            }),
            default_timeout: Duration::from_millis(settings.worker.timeout_ms),
        }
    }

    /// Create a client with an explicit worker binary path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let mut settings = Settings::default();
        settings.worker.path = Some(path.into().to_string_lossy().into_owned());
        Self::new(&settings)
    }

    /// Whether the client has permanently fallen back to local execution.
    ///
    /// The flag only ever goes from `false` to `true`; a client that lost
    /// its worker does not try to spawn another.
    pub fn is_unavailable(&self) -> bool {
        self.shared.unavailable.load(Ordering::Acquire)
    }

    /// Whether a worker process is currently attached.
    pub async fn is_spawned(&self) -> bool {
        self.shared.conn.lock().await.is_some()
    }

    /// The default per-request timeout.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute an operation with the default timeout.
    pub async fn request(&self, op: Op) -> WorkerResult<Value> {
        self.request_with_timeout(op, self.default_timeout).await
    }

    /// Execute an operation, waiting at most `timeout` for the worker.
    ///
    /// Requests routed to the local fallback complete synchronously on the
    /// caller's task and are not subject to the deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation itself fails (on either path), if
    /// no response arrives within `timeout`, or if the worker exits while
    /// the request is in flight.
    pub async fn request_with_timeout(&self, op: Op, timeout: Duration) -> WorkerResult<Value> {
        if !self.settings.enabled || self.is_unavailable() {
            return self.execute_local(&op);
        }

        let id = uuid::Uuid::new_v4().to_string();

        let rx = match self.dispatch(&id, &op).await {
            Ok(rx) => rx,
            Err(err) if err.is_transport() => {
                // The request never reached the worker; latch and serve it
                // locally. Anything already in flight is rejected instead.
                warn!(error = %err, "worker unusable, switching to local execution");
                self.mark_unavailable().await;
                return self.execute_local(&op);
            }
            Err(err) => return Err(err),
        };

        // Wait for response with timeout
        let response = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(WorkerError::ChannelClosed),
            Err(_) => {
                // Deadline elapsed — forget the entry so a late response or
                // a bulk flush finds nothing.
                let mut pending = self.shared.pending.lock().await;
                pending.remove(&id);
                return Err(WorkerError::Timeout {
                    op: op.name(),
                    ms: timeout.as_millis() as u64,
                });
            }
        };

        if response.success {
            Ok(response.result.unwrap_or(Value::Null))
        } else {
            let error = response.error.unwrap_or_else(|| ErrorInfo {
                code: "UNKNOWN".to_string(),
                message: "unknown worker error".to_string(),
            });
            Err(Self::classify_error(&error.code, &error.message))
        }
    }

    /// Ensure a worker is running, register the pending entry, and write
    /// the request line. Any failure here means the request never reached
    /// the worker.
    async fn dispatch(
        &self,
        id: &str,
        op: &Op,
    ) -> WorkerResult<oneshot::Receiver<ResponseEnvelope>> {
        let mut conn = self.shared.conn.lock().await;

        // The reader task may have latched while we waited for the lock.
        if self.is_unavailable() {
            return Err(WorkerError::WorkerExited);
        }

        if conn.is_none() {
            *conn = Some(self.spawn_worker()?);
        }
        let handle = conn.as_mut().expect("worker handle just created");

        let request = RequestEnvelope {
            id: id.to_string(),
            op: op.clone(),
        };
        let mut line = serde_json::to_string(&request).map_err(WorkerError::SerializeFailed)?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.shared.pending.lock().await;
            pending.insert(id.to_string(), tx);
        }

        let written = match handle.stdin.write_all(line.as_bytes()).await {
            Ok(()) => handle.stdin.flush().await,
            Err(err) => Err(err),
        };

        if let Err(err) = written {
            // Our entry was never in flight; remove it before the transport
            // flush rejects the rest.
            self.shared.pending.lock().await.remove(id);
            return Err(WorkerError::WriteFailed(err));
        }

        debug!(id, op = op.name(), "dispatched request to worker");
        Ok(rx)
    }

    /// Spawn the worker process and its response reader.
    fn spawn_worker(&self) -> WorkerResult<WorkerHandle> {
        let path = self.resolve_worker_path()?;

        let mut child = Command::new(&path)
            .args(self.format.to_worker_args())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::SpawnFailed)?;

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");

        let reader = Self::spawn_reader_task(stdout, self.shared.clone());
        debug!(path = %path.display(), "spawned worker process");

        Ok(WorkerHandle {
            stdin: BufWriter::new(stdin),
            child,
            reader,
        })
    }

    /// Resolve the worker binary path.
    ///
    /// Tries, in order: the configured path, the `SCRIV_WORKER` environment
    /// variable, common relative locations, and finally a PATH lookup.
    fn resolve_worker_path(&self) -> WorkerResult<PathBuf> {
        if let Some(path) = self.settings.resolved_path() {
            return Ok(path);
        }

        if let Ok(path) = std::env::var("SCRIV_WORKER") {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let candidates = [
            "scriv-worker",
            "./scriv-worker",
            "./target/debug/scriv-worker",
            "./target/release/scriv-worker",
        ];

        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }

        if let Ok(output) = std::process::Command::new("which")
            .arg("scriv-worker")
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        Err(WorkerError::WorkerNotFound)
    }

    /// Spawn the background task that reads responses from the worker.
    fn spawn_reader_task(stdout: ChildStdout, shared: Arc<Shared>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        // EOF - worker exited
                        break;
                    }
                    Ok(_) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(response) => {
                            let mut pending = shared.pending.lock().await;
                            match pending.remove(&response.id) {
                                Some(tx) => {
                                    // Send response to the waiting caller
                                    let _ = tx.send(response);
                                }
                                None => {
                                    // Already timed out; nothing to complete.
                                    debug!(id = %response.id, "dropping late response");
                                }
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "failed to parse worker response");
                        }
                    },
                    Err(err) => {
                        warn!(error = %err, "worker read error");
                        break;
                    }
                }
            }

            // Worker is gone: latch first so new requests go local, then
            // discard the dead handle and reject everything still waiting.
            shared.unavailable.store(true, Ordering::Release);
            drop(shared.conn.lock().await.take());

            let mut pending = shared.pending.lock().await;
            if !pending.is_empty() {
                warn!(
                    count = pending.len(),
                    "worker exited with requests in flight"
                );
            }
            for (id, tx) in pending.drain() {
                let _ = tx.send(ResponseEnvelope::failure(
                    id,
                    codes::WORKER_EXITED,
                    "worker process exited unexpectedly",
                ));
            }
        })
    }

    /// Latch the client into local-only mode, kill the worker, and reject
    /// all in-flight requests.
    async fn mark_unavailable(&self) {
        self.shared.unavailable.store(true, Ordering::Release);

        if let Some(mut handle) = self.shared.conn.lock().await.take() {
            handle.reader.abort();
            let _ = handle.child.start_kill();
        }

        let mut pending = self.shared.pending.lock().await;
        for (id, tx) in pending.drain() {
            let _ = tx.send(ResponseEnvelope::failure(
                id,
                codes::WORKER_EXITED,
                "worker process exited unexpectedly",
            ));
        }
    }

    /// Run an operation against the in-process handler table.
    fn execute_local(&self, op: &Op) -> WorkerResult<Value> {
        debug!(op = op.name(), "executing operation locally");
        ops::execute(op, &self.format).map_err(WorkerError::from)
    }

    /// Classify a worker error response into a specific error type.
    fn classify_error(code: &str, message: &str) -> WorkerError {
        match code {
            codes::EMPTY_INPUT => WorkerError::EmptyInput(message.to_string()),
            codes::INVALID_JSON => WorkerError::InvalidJson(message.to_string()),
            codes::STRINGIFY_FAILED => WorkerError::StringifyFailed(message.to_string()),
            codes::WORKER_EXITED => WorkerError::WorkerExited,
            _ => WorkerError::remote(code, message),
        }
    }
}

// Convenience wrappers so callers never touch operation names.
impl WorkerClient {
    /// Pretty-print a JSON value.
    pub async fn stringify(&self, value: &Value) -> WorkerResult<String> {
        self.stringify_with_timeout(value, self.default_timeout)
            .await
    }

    /// Pretty-print a JSON value with an explicit timeout.
    pub async fn stringify_with_timeout(
        &self,
        value: &Value,
        timeout: Duration,
    ) -> WorkerResult<String> {
        let result = self
            .request_with_timeout(
                Op::Stringify {
                    value: value.clone(),
                },
                timeout,
            )
            .await?;
        serde_json::from_value(result).map_err(WorkerError::DeserializeFailed)
    }

    /// Parse JSON text into a value.
    pub async fn parse(&self, text: &str) -> WorkerResult<Value> {
        self.parse_with_timeout(text, self.default_timeout).await
    }

    /// Parse JSON text with an explicit timeout.
    pub async fn parse_with_timeout(&self, text: &str, timeout: Duration) -> WorkerResult<Value> {
        self.request_with_timeout(
            Op::Parse {
                input: Value::String(text.to_string()),
            },
            timeout,
        )
        .await
    }

    /// Diff two JSON values. `Ok(None)` means they are identical.
    pub async fn diff(
        &self,
        baseline: &Value,
        candidate: &Value,
    ) -> WorkerResult<Option<DiffReport>> {
        self.diff_with_timeout(baseline, candidate, self.default_timeout)
            .await
    }

    /// Diff two JSON values with an explicit timeout.
    pub async fn diff_with_timeout(
        &self,
        baseline: &Value,
        candidate: &Value,
        timeout: Duration,
    ) -> WorkerResult<Option<DiffReport>> {
        let result = self
            .request_with_timeout(
                Op::Diff {
                    baseline: baseline.clone(),
                    candidate: candidate.clone(),
                },
                timeout,
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(WorkerError::DeserializeFailed)
    }
}

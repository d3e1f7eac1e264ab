//! NDJSON serve loop for the worker process.
//!
//! The loop is generic over its streams so tests can drive it in-memory;
//! the `scriv-worker` binary runs it over stdin/stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::protocol::{RequestEnvelope, ResponseEnvelope};
use crate::config::FormatSettings;
use crate::ops;

/// Serve requests from `input` until it closes, writing one response line
/// per request to `output`.
///
/// Responses happen to be written in request order; the client correlates
/// by id and does not rely on that.
pub async fn serve<R, W>(input: R, mut output: W, format: &FormatSettings) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: RequestEnvelope = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                // Without an id there is nothing to correlate; the client's
                // timeout covers the caller.
                warn!(error = %err, "ignoring unparsable request line");
                continue;
            }
        };

        let response = handle(request, format);
        let mut line = serde_json::to_string(&response)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        line.push('\n');

        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }

    Ok(())
}

/// Execute one request against the handler table.
fn handle(request: RequestEnvelope, format: &FormatSettings) -> ResponseEnvelope {
    debug!(id = %request.id, op = request.op.name(), "handling request");
    match ops::execute(&request.op, format) {
        Ok(result) => ResponseEnvelope::success(request.id, result),
        Err(err) => ResponseEnvelope::failure(request.id, err.code(), err.to_string()),
    }
}

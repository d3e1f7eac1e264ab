//! Integration tests for the worker client against live worker processes.
//!
//! The real `scriv-worker` binary exercises the happy paths; tiny shell
//! scripts stand in for workers that stall or die, so the timeout and
//! transport-failure paths run deterministically.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use scriv::config::Settings;
use scriv::worker::{WorkerClient, WorkerError};

/// Path to the worker binary built alongside the tests.
const WORKER_BIN: &str = env!("CARGO_BIN_EXE_scriv-worker");

static SCRIPT_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn live_client() -> WorkerClient {
    WorkerClient::with_path(WORKER_BIN)
}

/// Write an executable shell script that plays the role of a worker.
fn script_worker(body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "scriv-client-test-{}-{}",
        std::process::id(),
        SCRIPT_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("fake-worker.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[tokio::test]
async fn test_stringify_round_trip() {
    let client = live_client();
    let value = json!({"title": "FAQ", "entries": [{"q": "Why?"}], "draft": true});

    let text = client.stringify(&value).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(parsed, value);
    assert!(client.is_spawned().await);
    assert!(!client.is_unavailable());
}

#[tokio::test]
async fn test_parse_and_diff() {
    let client = live_client();

    let parsed = client.parse(r#"{"a": [1, 2]}"#).await.unwrap();
    assert_eq!(parsed, json!({"a": [1, 2]}));

    assert!(client.diff(&json!({"a": 1}), &json!({"a": 1})).await.unwrap().is_none());

    let report = client
        .diff(&json!({"a": 1}), &json!({"a": 2}))
        .await
        .unwrap()
        .expect("differing values produce a report");
    assert!(!report.is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_correlate() {
    let client = Arc::new(live_client());

    let mut handles = Vec::new();
    for i in 0..16i64 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let value = json!({"n": i, "pad": "x".repeat((i as usize % 5) * 64)});
            let text = client.stringify(&value).await.unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(parsed["n"], json!(i));
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert!(!client.is_unavailable());
}

#[tokio::test]
async fn test_error_response_does_not_latch() {
    let client = live_client();

    let err = client.parse("").await.unwrap_err();
    assert!(matches!(err, WorkerError::EmptyInput(_)));
    assert!(!err.to_string().is_empty());

    let err = client.parse("{\"a\":").await.unwrap_err();
    assert!(matches!(err, WorkerError::InvalidJson(_)));

    // A failed operation is scoped to its caller; the worker stays up.
    assert!(!client.is_unavailable());
    let text = client.stringify(&json!({"a": 1})).await.unwrap();
    assert_eq!(text, "{\n  \"a\": 1\n}");
}

#[tokio::test]
async fn test_timeout_rejects_with_op_name() {
    // Consumes requests but never answers.
    let stall = script_worker("cat >/dev/null");
    let client = WorkerClient::with_path(stall);

    let err = client
        .stringify_with_timeout(&json!({"a": 1}), Duration::from_millis(200))
        .await
        .unwrap_err();
    match err {
        WorkerError::Timeout { op, ms } => {
            assert_eq!(op, "stringify");
            assert_eq!(ms, 200);
        }
        other => panic!("expected timeout, got: {other}"),
    }

    // A timeout is per-request; the client has not latched and still talks
    // to the worker rather than failing over.
    assert!(!client.is_unavailable());
    let err = client
        .diff_with_timeout(&json!(1), &json!(2), Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Timeout { op: "diff", .. }));
}

#[tokio::test]
async fn test_transport_failure_latches_and_falls_back() {
    // Exits before answering anything.
    let flaky = script_worker("exit 0");
    let client = WorkerClient::with_path(flaky);
    let value = json!({"a": 1});

    // Depending on how quickly the process dies, the first call is either
    // rejected by the bulk flush or served locally after a failed write.
    match client.stringify(&value).await {
        Ok(text) => assert_eq!(text, "{\n  \"a\": 1\n}"),
        Err(err) => assert!(err.is_transport(), "unexpected error: {err}"),
    }
    assert!(client.is_unavailable());

    // From here on everything runs in-process with identical semantics.
    let text = client.stringify(&value).await.unwrap();
    assert_eq!(text, "{\n  \"a\": 1\n}");
    let err = client.parse("").await.unwrap_err();
    assert!(matches!(err, WorkerError::EmptyInput(_)));
    assert!(client.is_unavailable());
}

#[tokio::test]
async fn test_bulk_flush_rejects_all_pending() {
    // Accepts requests into the pipe, then dies with them in flight.
    let doomed = script_worker("sleep 0.5\nexit 0");
    let client = Arc::new(WorkerClient::with_path(doomed));

    let mut handles = Vec::new();
    for i in 0..3 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.stringify(&json!({"n": i})).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        let err = result.expect_err("pending requests are rejected on worker exit");
        assert!(matches!(err, WorkerError::WorkerExited));
    }

    assert!(client.is_unavailable());
    assert_eq!(
        client.stringify(&json!({"a": 1})).await.unwrap(),
        "{\n  \"a\": 1\n}"
    );
}

#[tokio::test]
async fn test_spawn_failure_falls_back_locally() {
    let client = WorkerClient::with_path("/nonexistent/scriv-worker");

    // The very first call is served by the fallback.
    let text = client.stringify(&json!({"a": 1})).await.unwrap();
    assert_eq!(text, "{\n  \"a\": 1\n}");
    assert!(client.is_unavailable());
    assert!(!client.is_spawned().await);
}

#[tokio::test]
async fn test_disabled_worker_runs_local() {
    let mut settings = Settings::default();
    settings.worker.enabled = false;
    settings.worker.path = Some(WORKER_BIN.to_string());
    let client = WorkerClient::new(&settings);

    let text = client.stringify(&json!({"a": 1})).await.unwrap();
    assert_eq!(text, "{\n  \"a\": 1\n}");

    // Disabled is configuration, not failure: nothing spawns, nothing latches.
    assert!(!client.is_spawned().await);
    assert!(!client.is_unavailable());
}

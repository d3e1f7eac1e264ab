//! Integration tests for the local fallback semantics.
//!
//! These pin the operation contract on the in-process path and check that
//! the worker path observes the same contract, since callers are not told
//! which path served them.

use serde_json::{json, Value};

use scriv::config::Settings;
use scriv::ops::DiffOp;
use scriv::worker::{WorkerClient, WorkerError};

const WORKER_BIN: &str = env!("CARGO_BIN_EXE_scriv-worker");

/// A client pinned to in-process execution.
fn local_client() -> WorkerClient {
    let mut settings = Settings::default();
    settings.worker.enabled = false;
    WorkerClient::new(&settings)
}

#[tokio::test]
async fn test_stringify_two_space_indent() {
    let client = local_client();
    let text = client.stringify(&json!({"a": 1})).await.unwrap();
    assert_eq!(text, "{\n  \"a\": 1\n}");
}

#[tokio::test]
async fn test_stringify_round_trips() {
    let client = local_client();
    let value = json!({
        "title": "Lesson 1",
        "blocks": [{"kind": "text", "body": "hello"}, {"kind": "quiz", "items": []}],
        "published": null
    });

    let text = client.stringify(&value).await.unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, value);
}

#[tokio::test]
async fn test_parse_contract() {
    let client = local_client();

    let err = client.parse("").await.unwrap_err();
    assert!(matches!(err, WorkerError::EmptyInput(_)));
    assert!(!err.to_string().is_empty());

    let err = client.parse("   ").await.unwrap_err();
    assert!(matches!(err, WorkerError::EmptyInput(_)));

    let err = client.parse("{\"a\":").await.unwrap_err();
    assert!(matches!(err, WorkerError::InvalidJson(_)));

    let parsed = client.parse("{\"a\": [1, 2]}").await.unwrap();
    assert_eq!(parsed, json!({"a": [1, 2]}));
}

#[tokio::test]
async fn test_diff_identity_sentinel() {
    let client = local_client();

    for value in [
        json!(null),
        json!("text"),
        json!([1, [2, 3]]),
        json!({"a": {"b": [null, false]}}),
    ] {
        assert!(
            client.diff(&value, &value).await.unwrap().is_none(),
            "identical values must produce no report: {value}"
        );
    }
}

#[tokio::test]
async fn test_diff_reports_changes() {
    let client = local_client();

    let report = client
        .diff(&json!({"a": 1}), &json!({"a": 2}))
        .await
        .unwrap()
        .expect("differing values produce a report");
    assert_eq!(
        report.ops,
        vec![DiffOp::Replace {
            path: vec!["a".to_string()],
            from: json!(1),
            to: json!(2),
        }]
    );
}

#[tokio::test]
async fn test_worker_and_fallback_agree() {
    let local = local_client();
    let live = WorkerClient::with_path(WORKER_BIN);

    let values = [
        json!({"a": 1}),
        json!([1, "two", null, {"three": 3.5}]),
        json!({"nested": {"deep": [{"deeper": {}}]}}),
        json!("plain string"),
    ];

    for value in &values {
        let local_text = local.stringify(value).await.unwrap();
        let live_text = live.stringify(value).await.unwrap();
        assert_eq!(local_text, live_text, "paths disagree for {value}");
    }

    // The worker served these, not the fallback.
    assert!(!live.is_unavailable());
    assert!(live.is_spawned().await);

    // Diff agrees on both the sentinel and the report.
    let baseline = json!({"a": 1, "b": 2});
    let candidate = json!({"a": 1, "c": 3});
    assert_eq!(
        local.diff(&baseline, &baseline).await.unwrap(),
        live.diff(&baseline, &baseline).await.unwrap()
    );
    assert_eq!(
        local.diff(&baseline, &candidate).await.unwrap(),
        live.diff(&baseline, &candidate).await.unwrap()
    );
}

#[tokio::test]
async fn test_custom_indent_applies_to_both_paths() {
    let mut settings = Settings::default();
    settings.format.indent = 4;
    settings.worker.enabled = false;
    let local = WorkerClient::new(&settings);

    let mut settings = Settings::default();
    settings.format.indent = 4;
    settings.worker.path = Some(WORKER_BIN.to_string());
    let live = WorkerClient::new(&settings);

    let value = json!({"a": 1});
    let expected = "{\n    \"a\": 1\n}";
    assert_eq!(local.stringify(&value).await.unwrap(), expected);
    assert_eq!(live.stringify(&value).await.unwrap(), expected);
}

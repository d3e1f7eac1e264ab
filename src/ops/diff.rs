//! Structural diff of JSON values.
//!
//! The identity short-circuit is the contractual part: identical inputs
//! produce no report at all. The report shape for differing inputs is a flat
//! list of JSON-Patch-style edits addressed by key/index segment paths.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deep equality over JSON values.
///
/// Recursive over arrays and objects; numbers compare by value, not by
/// source text.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
        }

        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, va)| b.get(key).map_or(false, |vb| deep_equal(va, vb)))
        }

        // Different types are never equal
        _ => false,
    }
}

/// One edit in a [`DiffReport`].
///
/// Paths are key/index segments from the document root; an empty path
/// addresses the root itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffOp {
    /// A key or element present only in the candidate.
    Add { path: Vec<String>, value: Value },

    /// A key or element present only in the baseline.
    Remove { path: Vec<String> },

    /// A value that changed between baseline and candidate.
    Replace {
        path: Vec<String>,
        from: Value,
        to: Value,
    },
}

/// Structured description of how a candidate differs from a baseline.
///
/// The edit list is an implementation detail; callers in this crate depend
/// only on identical inputs producing no report at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub ops: Vec<DiffOp>,
}

impl DiffReport {
    /// Number of edits in the report.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Diff two JSON values. Returns `None` when they are deep-equal.
pub fn diff(baseline: &Value, candidate: &Value) -> Option<DiffReport> {
    if deep_equal(baseline, candidate) {
        return None;
    }
    let mut ops = Vec::new();
    diff_at(&mut ops, &[], baseline, candidate);
    Some(DiffReport { ops })
}

fn diff_at(ops: &mut Vec<DiffOp>, path: &[String], baseline: &Value, candidate: &Value) {
    if deep_equal(baseline, candidate) {
        return;
    }
    match (baseline, candidate) {
        (Value::Object(b), Value::Object(c)) => diff_objects(ops, path, b, c),
        (Value::Array(b), Value::Array(c)) => diff_arrays(ops, path, b, c),
        _ => ops.push(DiffOp::Replace {
            path: path.to_vec(),
            from: baseline.clone(),
            to: candidate.clone(),
        }),
    }
}

fn diff_objects(
    ops: &mut Vec<DiffOp>,
    path: &[String],
    baseline: &Map<String, Value>,
    candidate: &Map<String, Value>,
) {
    for key in baseline.keys() {
        if !candidate.contains_key(key) {
            ops.push(DiffOp::Remove {
                path: child(path, key),
            });
        }
    }
    for (key, candidate_value) in candidate {
        match baseline.get(key) {
            None => ops.push(DiffOp::Add {
                path: child(path, key),
                value: candidate_value.clone(),
            }),
            Some(baseline_value) => {
                diff_at(ops, &child(path, key), baseline_value, candidate_value)
            }
        }
    }
}

fn diff_arrays(ops: &mut Vec<DiffOp>, path: &[String], baseline: &[Value], candidate: &[Value]) {
    let shared = baseline.len().min(candidate.len());
    for i in 0..shared {
        diff_at(ops, &child(path, i), &baseline[i], &candidate[i]);
    }
    for (i, value) in candidate.iter().enumerate().skip(shared) {
        ops.push(DiffOp::Add {
            path: child(path, i),
            value: value.clone(),
        });
    }
    // Removals run back-to-front so earlier indices stay valid while the
    // edits are applied in order.
    for i in (shared..baseline.len()).rev() {
        ops.push(DiffOp::Remove {
            path: child(path, i),
        });
    }
}

fn child(path: &[String], segment: impl ToString) -> Vec<String> {
    let mut path = path.to_vec();
    path.push(segment.to_string());
    path
}

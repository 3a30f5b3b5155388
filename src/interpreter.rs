//! Interpretation of the JSON payload carried inside the SOAP result.
//!
//! Upstream answers with loosely typed JSON: an object with optional
//! `ResultCode` and `ResultMessage` members plus arbitrary account fields.
//! Whatever the shape, the caller always gets an [`InterpretedResult`]; a
//! payload that is not JSON becomes a `success: false` result rather than an
//! error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Member holding the numeric outcome code.
pub const RESULT_CODE_FIELD: &str = "ResultCode";

/// Member holding the human readable outcome.
pub const RESULT_MESSAGE_FIELD: &str = "ResultMessage";

/// Label of the fallback detail that carries the raw payload.
pub const RAW_LABEL: &str = "raw";

/// Label of the detail produced by a bare scalar root.
pub const VALUE_LABEL: &str = "value";

pub const EMPTY_RESPONSE_MESSAGE: &str = "Service returned an empty response";
pub const UNPARSEABLE_RESPONSE_MESSAGE: &str = "Could not parse the service response";
pub const SUCCESS_MESSAGE: &str = "Operation completed";
pub const FAILURE_MESSAGE: &str = "Service returned an error";

/// One leaf field recovered from the payload.
///
/// `label` is the path to the leaf: `.name` per object member and `[i]` per
/// array element, e.g. `Account.Phones[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

impl DetailEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Normalized view of one upstream answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretedResult {
    pub success: bool,
    pub code: Option<i32>,
    pub message: String,
    pub details: Vec<DetailEntry>,
    /// Compact JSON of the root, or the original text when it was not JSON
    pub raw: String,
}

/// Interpret the payload text extracted from a SOAP response.
///
/// Success follows the upstream contract: an answer is successful unless it
/// carries a `ResultCode` below zero. This is the service's convention, not a
/// property of the data.
///
/// A key repeated within one object collapses to a single entry: the last
/// value wins, listed at the position of the first occurrence. `raw` is the
/// re-serialized tree and shows the collapsed object as well.
pub fn interpret_payload(payload: &str) -> InterpretedResult {
    if payload.trim().is_empty() {
        return InterpretedResult {
            success: false,
            code: None,
            message: EMPTY_RESPONSE_MESSAGE.to_string(),
            details: Vec::new(),
            raw: String::new(),
        };
    }

    let root: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Failed to parse SOAP JSON payload");
            return InterpretedResult {
                success: false,
                code: None,
                message: UNPARSEABLE_RESPONSE_MESSAGE.to_string(),
                details: vec![DetailEntry::new(RAW_LABEL, payload)],
                raw: payload.to_string(),
            };
        }
    };

    let raw = root.to_string();

    let (code, message, mut details) = match &root {
        Value::Object(map) => interpret_object(map),
        other => (None, None, flatten_root(other)),
    };

    if details.is_empty() {
        details.push(DetailEntry::new(RAW_LABEL, raw.clone()));
    }

    let success = code.map_or(true, |c| c >= 0);
    let message = match message {
        Some(m) if !m.trim().is_empty() => m,
        _ if success => SUCCESS_MESSAGE.to_string(),
        _ => FAILURE_MESSAGE.to_string(),
    };

    InterpretedResult {
        success,
        code,
        message,
        details,
        raw,
    }
}

fn interpret_object(map: &Map<String, Value>) -> (Option<i32>, Option<String>, Vec<DetailEntry>) {
    let code = map.get(RESULT_CODE_FIELD).and_then(result_code);
    let message = map
        .get(RESULT_MESSAGE_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut details = Vec::new();
    for (name, value) in map {
        if name == RESULT_CODE_FIELD || name == RESULT_MESSAGE_FIELD {
            continue;
        }
        flatten(value, name, &mut details);
    }

    (code, message, details)
}

/// Only JSON integers that fit an `i32` count as a result code.
fn result_code(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|c| i32::try_from(c).ok())
}

/// Flatten a non-object root. A bare scalar becomes a single `value` entry.
fn flatten_root(root: &Value) -> Vec<DetailEntry> {
    let mut details = Vec::new();
    match root {
        Value::Array(_) => flatten(root, "", &mut details),
        _ => flatten(root, VALUE_LABEL, &mut details),
    }
    details
}

/// Depth-first flattening of `value` into `out`, with `path` as the label of
/// `value` itself.
pub fn flatten(value: &Value, path: &str, out: &mut Vec<DetailEntry>) {
    match value {
        Value::Object(map) => {
            for (name, nested) in map {
                let nested_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{path}.{name}")
                };
                flatten(nested, &nested_path, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(item, &format!("{path}[{index}]"), out);
            }
        }
        Value::Null => {}
        Value::String(s) => push_leaf(out, path, s),
        Value::Number(n) => push_leaf(out, path, &n.to_string()),
        Value::Bool(b) => push_leaf(out, path, if *b { "true" } else { "false" }),
    }
}

fn push_leaf(out: &mut Vec<DetailEntry>, path: &str, value: &str) {
    if !value.trim().is_empty() {
        out.push(DetailEntry::new(path, value));
    }
}

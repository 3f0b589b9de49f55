//! Query-string serialization for GET calls
//!
//! Only truthy values are serialized: `null`, `false`, `0`, `""` are dropped.
//! Known quirk kept for compatibility with existing agents: a caller cannot
//! send `limit=0` or `is_favorite=false` through a query string.

use serde_json::{Map, Value};

/// Collect the truthy entries of `params` as string pairs, in map order.
pub fn truthy_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| is_truthy(value))
        .map(|(key, value)| (key.clone(), stringify(value)))
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

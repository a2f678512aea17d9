//! JSON text columns.
//!
//! List and object attributes are stored as JSON text. Readers are lenient:
//! malformed text yields an empty value instead of an error.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Result, RivalError};

/// Serialize a value for storage.
pub fn to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| RivalError::Validation(e.to_string()))
}

/// Convert a JSON value into a list of strings.
///
/// Non-string elements are kept as compact JSON; a lone string becomes a
/// single-element list.
pub fn value_to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if s.trim().is_empty() => None,
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Convert a JSON value into an object, or an empty one.
pub fn value_to_object(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}

/// Read a stored string list.
pub fn string_list(text: &str) -> Vec<String> {
    serde_json::from_str::<Value>(text)
        .map(|v| value_to_string_list(&v))
        .unwrap_or_default()
}

/// Read a stored JSON object.
pub fn json_object(text: &str) -> Map<String, Value> {
    serde_json::from_str::<Value>(text)
        .map(|v| value_to_object(&v))
        .unwrap_or_default()
}

/// Read a stored list of arbitrary JSON values, dropping nulls.
pub fn value_list(text: &str) -> Vec<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items.into_iter().filter(|v| !v.is_null()).collect(),
        _ => Vec::new(),
    }
}

// SPDX-License-Identifier: MIT

//! Ordered dotted-path lookup over parsed JSON.
//!
//! The registry returns the same data under different keys depending on
//! endpoint version, so every extracted field is described as an ordered
//! list of candidate paths and the first non-empty match wins.

use serde_json::Value;

/// Walk a single dotted path (`"a.b.c"`) into a JSON tree.
///
/// Path segments index into objects by key; a segment that parses as a
/// number indexes into arrays.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let idx: usize = segment.parse().ok()?;
                items.get(idx)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Return the first non-empty value among an ordered list of dotted paths.
pub fn first_at_paths<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| resolve_path(value, path))
        .find(|v| !is_empty(v))
}

/// First path that resolves to a non-blank string.
///
/// Bare numbers are accepted and stringified; upstream has been seen to
/// return zip codes and internal ids as numbers.
pub fn first_string_at(value: &Value, paths: &[&str]) -> Option<String> {
    match first_at_paths(value, paths)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First path that resolves to a non-empty array.
pub fn first_array_at<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Vec<Value>> {
    match first_at_paths(value, paths)? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// First path that resolves to a non-empty object.
pub fn first_object_at<'a>(
    value: &'a Value,
    paths: &[&str],
) -> Option<&'a serde_json::Map<String, Value>> {
    match first_at_paths(value, paths)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Null, blank strings, and empty containers all count as "no value".
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

// SPDX-License-Identifier: MIT

//! Shared helpers for normalizing registry values.

use serde_json::Value;

/// Normalize a lookup key: trimmed and upper-cased.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Sanitize a tax identifier: strip all whitespace and upper-case.
///
/// A candidate without a single digit is rejected; the registry sometimes
/// echoes a name fragment in tax-id positions and those must not be kept.
pub fn sanitize_tax_id(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(cleaned)
}

/// Coerce a JSON value to a finite number.
///
/// Accepts real numbers and numeric strings; anything non-finite or
/// non-numeric is dropped rather than guessed at.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

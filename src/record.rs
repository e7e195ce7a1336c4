//! The record model.
//!
//! A record is one event's structured key-value data passing through the
//! pipeline: an ordered mapping from field name to a value of
//! heterogeneous type (string, number, boolean, array, nested mapping).
//! Records are owned transiently by the `apply` call that processes them.

use serde_json::Value;

/// One event record: an ordered mapping from field name to value.
///
/// `serde_json`'s `preserve_order` feature keeps fields in declaration
/// order, so selector iteration and re-serialization are stable.
pub type Record = serde_json::Map<String, Value>;

/// Returns the string form of a value as seen by the digest transforms
/// and by value-pattern matching.
///
/// Strings yield their contents, null yields the empty string, and every
/// other shape (numbers, booleans, arrays, nested mappings) yields its
/// compact JSON serialization. Array and mapping values only reach this
/// coercion through the whole-value fallback, when per-element masking is
/// not requested.
#[must_use]
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Canonical JSON: object keys sorted, no whitespace between tokens.
//!
//! Two values that are equal as JSON always canonicalize to the same bytes,
//! regardless of the key order they were built or parsed with.

use serde::Serialize;
use serde_json::{Map, Value};

/// Rebuild `value` with every object's keys inserted in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical compact rendering of a JSON value.
pub fn canonical_json(value: &Value) -> String {
    // Display for Value is the compact serializer.
    canonicalize(value).to_string()
}

/// Canonical rendering of any serializable value.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    Ok(canonical_json(&value))
}

//! JSON normalization utilities.
//!
//! Canonicalizes JSON by sorting object keys recursively. Used for
//! order-insensitive fingerprints and content keys of routing rules.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Recursively normalize a JSON value by sorting object keys.
///
/// - Objects: Keys are sorted alphabetically, values are recursively normalized
/// - Arrays: Order is preserved, elements are recursively normalized
/// - Scalars: Returned as-is
///
/// # Examples
/// ```
/// use serde_json::json;
/// use xr_config::json_norm::normalize_value;
///
/// let output = normalize_value(json!({"z": 1, "a": 2}));
/// assert_eq!(output.to_string(), r#"{"a":2,"z":1}"#);
/// ```
#[must_use]
pub fn normalize_value(v: Value) -> Value {
    match v {
        Value::Object(mut m) => {
            let mut nm = Map::new();
            let mut keys: Vec<_> = m.keys().cloned().collect();
            keys.sort_unstable();
            for k in keys {
                if let Some(vv) = m.remove(&k) {
                    nm.insert(k, normalize_value(vv));
                }
            }
            Value::Object(nm)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_value).collect()),
        x => x,
    }
}

/// Canonical compact text of a value (sorted keys).
#[must_use]
pub fn canonical_string(v: &Value) -> String {
    normalize_value(v.clone()).to_string()
}

/// SHA256-8 fingerprint (first 8 hex digits) of the canonical form.
#[must_use]
pub fn fingerprint(v: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_string(v).as_bytes());
    let result = hasher.finalize();
    format!(
        "{:08x}",
        u32::from_be_bytes([result[0], result[1], result[2], result[3]])
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_ignores_key_order() {
        let a = json!({"b": [1, {"y": 1, "x": 2}], "a": null});
        let b = json!({"a": null, "b": [1, {"x": 2, "y": 1}]});
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 8);
    }

    #[test]
    fn fingerprint_respects_array_order() {
        assert_ne!(fingerprint(&json!([1, 2])), fingerprint(&json!([2, 1])));
    }
}

//! Cache Key Module
//!
//! Derives deterministic `<namespace>:<hash>` keys from structured request parameters.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

/// Number of digest bytes kept in a derived key (16 hex characters).
pub const KEY_HASH_BYTES: usize = 8;

// == Derive Key ==
/// Builds a cache key from a namespace and a parameter mapping.
///
/// Parameters are serialized to JSON, object keys are sorted at every nesting
/// level, and the compact text is hashed with SHA-256. Insertion order never
/// affects the result. Arrays keep their element order.
///
/// # Errors
/// `CacheError::InvalidKeyInput` if the namespace is empty, the parameters are
/// not a mapping, or they cannot be represented as JSON.
///
/// # Example
/// ```
/// use research_cache::cache::derive_key;
/// use serde_json::json;
///
/// let a = derive_key("guided", &json!({"ticker": "AAPL", "step": "news"})).unwrap();
/// let b = derive_key("guided", &json!({"step": "news", "ticker": "AAPL"})).unwrap();
/// assert_eq!(a, b);
/// assert!(a.starts_with("guided:"));
/// ```
pub fn derive_key<P: Serialize + ?Sized>(namespace: &str, params: &P) -> Result<String> {
    if namespace.is_empty() {
        return Err(CacheError::InvalidKeyInput(
            "namespace cannot be empty".to_string(),
        ));
    }

    let value = serde_json::to_value(params)
        .map_err(|e| CacheError::InvalidKeyInput(e.to_string()))?;

    let params = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(CacheError::InvalidKeyInput(format!(
                "parameters must be a mapping, got {}",
                json_kind(&other)
            )))
        }
    };

    let canonical = canonicalize(Value::Object(params));
    let text = serde_json::to_string(&canonical)
        .map_err(|e| CacheError::InvalidKeyInput(e.to_string()))?;

    let digest = Sha256::digest(text.as_bytes());
    Ok(format!(
        "{}:{}",
        namespace,
        hex::encode(&digest[..KEY_HASH_BYTES])
    ))
}

/// Rebuilds objects with their keys inserted in sorted order, recursively.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        scalar => scalar,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

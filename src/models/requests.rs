//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for storing an entry (PUT /api/cache/entries)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON payload
/// - `ttl`: Optional TTL in seconds, takes precedence over `category`
/// - `category`: Optional content category resolved through the TTL policy
#[derive(Debug, Clone, Deserialize)]
pub struct SetEntryRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl SetEntryRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if self.ttl == Some(0) {
            return Some("TTL must be a positive number of seconds".to_string());
        }
        None
    }
}

/// Request body for key derivation (POST /api/cache/key)
#[derive(Debug, Clone, Deserialize)]
pub struct DeriveKeyRequest {
    pub namespace: String,
    /// Parameter mapping; omitted means no parameters
    #[serde(default)]
    pub params: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "price:aapl", "value": {"price": 189.5}}"#;
        let req: SetEntryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "price:aapl");
        assert_eq!(req.value, json!({"price": 189.5}));
        assert!(req.ttl.is_none());
        assert!(req.category.is_none());
    }

    #[test]
    fn test_set_request_with_category() {
        let json = r#"{"key": "k", "value": "v", "category": "news"}"#;
        let req: SetEntryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.category.as_deref(), Some("news"));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetEntryRequest {
            key: "".to_string(),
            value: json!("test"),
            ttl: None,
            category: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let req = SetEntryRequest {
            key: "k".to_string(),
            value: json!("test"),
            ttl: Some(0),
            category: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetEntryRequest {
            key: "valid_key".to_string(),
            value: json!("test"),
            ttl: Some(60),
            category: None,
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_derive_request_params_default() {
        let req: DeriveKeyRequest = serde_json::from_str(r#"{"namespace": "market"}"#).unwrap();
        assert_eq!(req.namespace, "market");
        assert!(req.params.is_null());
    }
}

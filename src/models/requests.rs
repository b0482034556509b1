//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under; may be empty
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds; absent or 0 stores without expiry
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let body = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, json!("hello"));
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let body = r#"{"key": "test", "value": {"n": 1}, "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.value, json!({"n": 1}));
        assert_eq!(req.ttl, Some(60));
    }

    #[test]
    fn test_set_request_rejects_negative_ttl() {
        let body = r#"{"key": "test", "value": 1, "ttl": -5}"#;
        assert!(serde_json::from_str::<SetRequest>(body).is_err());
    }
}

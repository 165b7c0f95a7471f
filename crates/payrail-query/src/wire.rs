//! Wire format shared by the query server and the federation client.

use serde::{Deserialize, Serialize};

/// One (key, value) pair of a store enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueRow {
    /// Flat store key (`key@window_start` for windowed entries).
    pub key: String,
    /// JSON-encoded stored value.
    pub value: serde_json::Value,
}

/// Point-lookup response. `value` is `None` when the store exists but the
/// key does not - distinguishable from an unknown store, which is a 404.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueResponse {
    /// The stored value, if present.
    pub value: Option<serde_json::Value>,
}

/// Row-count response for one instance's local partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    /// Local row count.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_response_round_trip() {
        let resp = ValueResponse {
            value: Some(serde_json::json!({"balance": "10"})),
        };
        let bytes = serde_json::to_vec(&resp).unwrap();
        let back: ValueResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn test_absent_value_round_trip() {
        let bytes = serde_json::to_vec(&ValueResponse { value: None }).unwrap();
        let back: ValueResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.value, None);
    }
}

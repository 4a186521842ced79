//! Canonical JSON serialization: sorted keys, no whitespace.
//!
//! This is the plaintext form of every encrypted field value, so the same
//! value always produces the same bytes regardless of key ordering.

use serde_json::Value;

use crate::error::FieldError;

fn quote(s: &str) -> Result<String, FieldError> {
    serde_json::to_string(s).map_err(|e| FieldError::Serialization(e.to_string()))
}

/// Serialize a value canonically.
pub fn canonical_json(value: &Value) -> Result<String, FieldError> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => quote(s),
        Value::Array(arr) => {
            let items: Result<Vec<String>, _> = arr.iter().map(canonical_json).collect();
            Ok(format!("[{}]", items?.join(",")))
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let pairs: Result<Vec<String>, FieldError> = keys
                .iter()
                .map(|k| Ok(format!("{}:{}", quote(k)?, canonical_json(&obj[k.as_str()])?)))
                .collect();
            Ok(format!("{{{}}}", pairs?.join(",")))
        }
    }
}

/// Parse bytes produced by [`canonical_json`] back into a value.
pub fn parse_canonical(bytes: &[u8]) -> Result<Value, FieldError> {
    serde_json::from_slice(bytes).map_err(|e| FieldError::Serialization(e.to_string()))
}

//! Confidentiality qualifier detection.
//!
//! A node is tagged for encryption when its `qualifiers` array holds an entry
//! with `type == "confidentiality"` and `value == "encrypted"`, compared after
//! trimming and without regard to case.

use serde_json::{Map, Value};

pub const QUALIFIERS_KEY: &str = "qualifiers";
pub const VALUE_KEY: &str = "value";
pub const CONFIDENTIALITY_TYPE: &str = "confidentiality";
pub const ENCRYPTED_VALUE: &str = "encrypted";

fn field_matches(qualifier: &Map<String, Value>, key: &str, expected: &str) -> bool {
    qualifier
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| s.trim().eq_ignore_ascii_case(expected))
}

fn is_encrypted_qualifier(qualifier: &Value) -> bool {
    qualifier.as_object().is_some_and(|q| {
        field_matches(q, "type", CONFIDENTIALITY_TYPE)
            && field_matches(q, VALUE_KEY, ENCRYPTED_VALUE)
    })
}

/// True if this object carries a confidentiality=encrypted qualifier.
pub fn is_tagged_object(node: &Map<String, Value>) -> bool {
    node.get(QUALIFIERS_KEY)
        .and_then(Value::as_array)
        .is_some_and(|qualifiers| qualifiers.iter().any(is_encrypted_qualifier))
}

/// True if `node` is an object carrying a confidentiality=encrypted qualifier.
pub fn is_tagged(node: &Value) -> bool {
    node.as_object().is_some_and(is_tagged_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_tag() {
        let node = json!({
            "idShort": "SupplierPrice",
            "qualifiers": [
                {"type": "visibility", "value": "internal"},
                {"type": "Confidentiality", "value": "encrypted"}
            ],
            "value": "12.40"
        });
        assert!(is_tagged(&node));
    }

    #[test]
    fn trims_and_ignores_case() {
        let node = json!({"qualifiers": [{"type": "  CONFIDENTIALITY ", "value": "Encrypted\n"}]});
        assert!(is_tagged(&node));
    }

    #[test]
    fn other_confidentiality_levels_are_not_tagged() {
        let node = json!({"qualifiers": [{"type": "confidentiality", "value": "restricted"}]});
        assert!(!is_tagged(&node));
    }

    #[test]
    fn requires_both_fields_on_one_qualifier() {
        let node = json!({"qualifiers": [
            {"type": "confidentiality", "value": "public"},
            {"type": "other", "value": "encrypted"}
        ]});
        assert!(!is_tagged(&node));
    }

    #[test]
    fn ignores_malformed_qualifiers() {
        assert!(!is_tagged(&json!({"qualifiers": "confidentiality"})));
        assert!(!is_tagged(&json!({"qualifiers": [null, 3, "x"]})));
        assert!(!is_tagged(&json!({"qualifiers": [{"type": 1, "value": true}]})));
        assert!(!is_tagged(&json!([{"type": "confidentiality", "value": "encrypted"}])));
        assert!(!is_tagged(&json!("encrypted")));
    }
}

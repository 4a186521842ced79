//! In-document marker protocol.
//!
//! An encrypted value is replaced in the sanitized document by:
//!
//! ```json
//! {
//!   "enc_ref": "<uuid>",
//!   "enc_hash": "<hex sha256(ciphertext)>",
//!   "enc_alg": "AES-256-GCM",
//!   "enc_v": "1"
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::FieldError;

pub const MARKER_REF_KEY: &str = "enc_ref";
pub const MARKER_HASH_KEY: &str = "enc_hash";
pub const MARKER_ALG_KEY: &str = "enc_alg";
pub const MARKER_VERSION_KEY: &str = "enc_v";

/// Marker format version. Also bound into every field AAD.
pub const MARKER_VERSION: &str = "1";

/// Algorithm label recorded for every encrypted field.
pub const FIELD_ALGORITHM: &str = "AES-256-GCM";

/// Key-id label on field records: fields are always under the revision DEK.
pub const FIELD_KEY_ID: &str = "revision-dek";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(rename = "enc_ref")]
    pub ref_id: String,
    #[serde(rename = "enc_hash")]
    pub hash: String,
    #[serde(rename = "enc_alg")]
    pub algorithm: String,
    #[serde(rename = "enc_v")]
    pub version: String,
}

impl Marker {
    pub fn new(ref_id: String, hash: String) -> Self {
        Self {
            ref_id,
            hash,
            algorithm: FIELD_ALGORITHM.to_string(),
            version: MARKER_VERSION.to_string(),
        }
    }

    pub fn to_value(&self) -> Result<Value, FieldError> {
        serde_json::to_value(self).map_err(|e| FieldError::Serialization(e.to_string()))
    }
}

/// True if this object is an in-document marker (has a string `enc_ref`).
pub fn is_marker_object(node: &Map<String, Value>) -> bool {
    node.get(MARKER_REF_KEY).is_some_and(Value::is_string)
}

/// True if `node` is an in-document marker.
pub fn is_marker(node: &Value) -> bool {
    node.as_object().is_some_and(is_marker_object)
}

/// Hex-encoded SHA-256 of a ciphertext, as stored in `enc_hash`.
pub fn marker_hash(ciphertext: &[u8]) -> String {
    hex::encode(Sha256::digest(ciphertext))
}

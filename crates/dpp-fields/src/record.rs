use chrono::{DateTime, Utc};
use dpp_crypto::WrappedDek;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One encrypted leaf of a document revision, as handed to persistence.
///
/// Rows are unique per (revision, path) and are deleted with their revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFieldRecord {
    /// Matches the marker's `enc_ref`.
    pub ref_id: String,
    /// JSON Pointer of the encrypted value within the document.
    pub path: String,
    #[serde(with = "serde_bytes")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub nonce: Vec<u8>,
    pub key_id: String,
    pub algorithm: String,
    /// Hex SHA-256 of `ciphertext`.
    pub marker_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Result of [`crate::DocumentFieldEncryptor::prepare`].
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    /// Sanitized document: tagged values replaced by markers.
    pub document: Value,
    pub records: Vec<EncryptedFieldRecord>,
    /// `None` when the document had nothing to encrypt; the caller stores
    /// nulls for the wrapped DEK, KEK id and wrap algorithm.
    pub wrapped_dek: Option<WrappedDek>,
}

impl PreparedDocument {
    pub fn has_encrypted_content(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn wrapped_dek(&self) -> Option<&str> {
        self.wrapped_dek.as_ref().map(|w| w.wrapped.as_str())
    }

    pub fn kek_id(&self) -> Option<&str> {
        self.wrapped_dek.as_ref().map(|w| w.kek_id.as_str())
    }

    pub fn wrap_algorithm(&self) -> Option<&str> {
        self.wrapped_dek.as_ref().map(|w| w.algorithm.as_str())
    }
}

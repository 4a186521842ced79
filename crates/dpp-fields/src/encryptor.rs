//! Selective encryption of tagged values inside DPP documents.
//!
//! `prepare` walks a document, encrypts every tagged `value` under one fresh
//! DEK and swaps it for a marker. `resolve` reverses that given the persisted
//! rows and the wrapped DEK.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dpp_crypto::{build_document_field_aad, Dek, KeyringEncryptor, DEK_WRAP_ALGORITHM};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::canonical::{canonical_json, parse_canonical};
use crate::error::FieldError;
use crate::marker::{
    is_marker, is_marker_object, marker_hash, Marker, FIELD_ALGORITHM, FIELD_KEY_ID,
    MARKER_HASH_KEY, MARKER_REF_KEY, MARKER_VERSION,
};
use crate::pointer::join_pointer;
use crate::qualifier::{is_tagged_object, VALUE_KEY};
use crate::record::{EncryptedFieldRecord, PreparedDocument};
use crate::walk::{walk_objects, walk_objects_mut, Descend};

/// AAD for one document field: binds tenant, pointer and marker version.
pub fn build_field_aad(tenant_id: &str, path: &str) -> Vec<u8> {
    build_document_field_aad(tenant_id, path, MARKER_VERSION)
}

fn should_encrypt(node: &Map<String, Value>) -> bool {
    is_tagged_object(node) && node.get(VALUE_KEY).is_some_and(|v| !is_marker(v))
}

/// Pointers of every value that [`DocumentFieldEncryptor::prepare`] would
/// encrypt, in traversal order.
pub fn find_tagged_paths(document: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    walk_objects(document, &mut |pointer, node| {
        if !should_encrypt(node) {
            return Descend::All;
        }
        paths.push(join_pointer(pointer, VALUE_KEY));
        // Tagged nodes inside the value travel in its ciphertext.
        Descend::Skip(VALUE_KEY)
    });
    paths
}

/// Encrypt the tagged value of `node` (if any) and replace it with a marker.
fn seal_tagged_value(
    dek: &Dek,
    tenant_id: &str,
    pointer: &str,
    node: &mut Map<String, Value>,
    records: &mut Vec<EncryptedFieldRecord>,
) -> Result<(), FieldError> {
    if !should_encrypt(node) {
        return Ok(());
    }
    let Some(value) = node.get(VALUE_KEY) else {
        return Ok(());
    };

    let path = join_pointer(pointer, VALUE_KEY);
    let plaintext = Zeroizing::new(canonical_json(value)?.into_bytes());
    let sealed = dek.seal(&plaintext, &build_field_aad(tenant_id, &path))?;

    let ref_id = Uuid::new_v4().to_string();
    let hash = marker_hash(&sealed.ciphertext);
    let marker = Marker::new(ref_id.clone(), hash.clone()).to_value()?;
    node.insert(VALUE_KEY.to_string(), marker);

    records.push(EncryptedFieldRecord {
        ref_id,
        path,
        ciphertext: sealed.ciphertext,
        nonce: sealed.nonce.to_vec(),
        key_id: FIELD_KEY_ID.to_string(),
        algorithm: FIELD_ALGORITHM.to_string(),
        marker_hash: hash,
        created_at: Utc::now(),
    });
    Ok(())
}

/// Everything `resolve` needs while rebuilding one document.
struct ResolveContext<'a> {
    dek: Dek,
    tenant_id: &'a str,
    rows: HashMap<&'a str, &'a EncryptedFieldRecord>,
}

impl ResolveContext<'_> {
    fn rebuild(&self, node: &Value) -> Result<Value, FieldError> {
        match node {
            Value::Object(map) if is_marker_object(map) => self.open_marker(map),
            Value::Object(map) => map
                .iter()
                .map(|(key, child)| Ok((key.clone(), self.rebuild(child)?)))
                .collect::<Result<Map<String, Value>, FieldError>>()
                .map(Value::Object),
            Value::Array(items) => items
                .iter()
                .map(|child| self.rebuild(child))
                .collect::<Result<Vec<Value>, FieldError>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn open_marker(&self, marker: &Map<String, Value>) -> Result<Value, FieldError> {
        let ref_id = marker
            .get(MARKER_REF_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let row = self
            .rows
            .get(ref_id)
            .ok_or_else(|| FieldError::MissingRow(ref_id.to_string()))?;

        if let Some(expected) = marker.get(MARKER_HASH_KEY).and_then(Value::as_str) {
            if !marker_hash(&row.ciphertext).eq_ignore_ascii_case(expected) {
                return Err(FieldError::HashMismatch(ref_id.to_string()));
            }
        }
        if row.algorithm != FIELD_ALGORITHM {
            return Err(FieldError::UnsupportedAlgorithm(row.algorithm.clone()));
        }

        let aad = build_field_aad(self.tenant_id, &row.path);
        let plaintext = Zeroizing::new(self.dek.open(&row.nonce, &row.ciphertext, &aad)?);
        parse_canonical(&plaintext)
    }
}

/// Document field encryptor over a shared keyring.
#[derive(Debug, Clone)]
pub struct DocumentFieldEncryptor {
    keyring: Arc<KeyringEncryptor>,
}

impl DocumentFieldEncryptor {
    pub fn new(keyring: Arc<KeyringEncryptor>) -> Self {
        Self { keyring }
    }

    /// Encrypt every tagged value of `document` for `tenant_id`.
    ///
    /// The input is never modified. When nothing is tagged the document is
    /// returned as-is with no records and no wrapped DEK.
    pub fn prepare(
        &self,
        document: &Value,
        tenant_id: &str,
    ) -> Result<PreparedDocument, FieldError> {
        let mut sanitized = document.clone();
        let dek = Dek::generate()?;
        let mut records = Vec::new();

        walk_objects_mut(&mut sanitized, &mut |pointer, node| {
            seal_tagged_value(&dek, tenant_id, pointer, node, &mut records)
        })?;

        if records.is_empty() {
            return Ok(PreparedDocument {
                document: sanitized,
                records,
                wrapped_dek: None,
            });
        }

        let wrapped = self.keyring.wrap_dek(dek.as_bytes())?;
        debug!(
            fields = records.len(),
            kek_id = %wrapped.kek_id,
            "encrypted tagged document fields"
        );
        Ok(PreparedDocument {
            document: sanitized,
            records,
            wrapped_dek: Some(wrapped),
        })
    }

    /// Replace every marker in `document` with its decrypted value.
    ///
    /// `wrap_algorithm` defaults to the only supported algorithm when the
    /// caller has no stored value for it.
    pub fn resolve(
        &self,
        document: &Value,
        tenant_id: &str,
        rows: &[EncryptedFieldRecord],
        wrapped_dek: Option<&str>,
        kek_id: Option<&str>,
        wrap_algorithm: Option<&str>,
    ) -> Result<Value, FieldError> {
        if rows.is_empty() {
            return Ok(document.clone());
        }
        let (Some(wrapped_dek), Some(kek_id)) = (wrapped_dek, kek_id) else {
            return Err(FieldError::MissingDek);
        };

        let dek = self.keyring.unwrap_dek(
            wrapped_dek,
            kek_id,
            wrap_algorithm.unwrap_or(DEK_WRAP_ALGORITHM),
        )?;
        let ctx = ResolveContext {
            dek,
            tenant_id,
            rows: rows.iter().map(|row| (row.ref_id.as_str(), row)).collect(),
        };

        let resolved = ctx.rebuild(document)?;
        debug!(rows = rows.len(), kek_id, "resolved encrypted document fields");
        Ok(resolved)
    }

    /// [`DocumentFieldEncryptor::resolve`] over the output of `prepare`.
    pub fn resolve_prepared(
        &self,
        prepared: &PreparedDocument,
        tenant_id: &str,
    ) -> Result<Value, FieldError> {
        self.resolve(
            &prepared.document,
            tenant_id,
            &prepared.records,
            prepared.wrapped_dek(),
            prepared.kek_id(),
            prepared.wrap_algorithm(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpp_crypto::base64_encode;
    use serde_json::json;

    fn encryptor() -> DocumentFieldEncryptor {
        let keyring = KeyringEncryptor::from_master_key(&base64_encode(&[0x42; 32])).unwrap();
        DocumentFieldEncryptor::new(Arc::new(keyring))
    }

    fn tagged(value: Value) -> Value {
        json!({
            "modelType": "Property",
            "qualifiers": [{"type": "confidentiality", "value": "encrypted"}],
            "value": value
        })
    }

    #[test]
    fn untagged_document_is_unchanged() {
        let doc = json!({"id": "urn:dpp:1", "submodels": [{"value": 1}]});
        let prepared = encryptor().prepare(&doc, "t1").unwrap();
        assert_eq!(prepared.document, doc);
        assert!(prepared.records.is_empty());
        assert!(prepared.wrapped_dek.is_none());
        assert!(!prepared.has_encrypted_content());
    }

    #[test]
    fn encrypts_only_tagged_value() {
        let doc = json!({"a": {"b": tagged(json!("secret")), "c": "public"}});
        let prepared = encryptor().prepare(&doc, "t1").unwrap();

        assert_eq!(prepared.records.len(), 1);
        let record = &prepared.records[0];
        assert_eq!(record.path, "/a/b/value");
        assert_eq!(record.key_id, "revision-dek");
        assert_eq!(record.nonce.len(), 12);
        assert_eq!(record.marker_hash, marker_hash(&record.ciphertext));

        let marker = prepared.document.pointer("/a/b/value").unwrap();
        assert_eq!(marker["enc_ref"], json!(record.ref_id));
        assert_eq!(marker["enc_hash"], json!(record.marker_hash));
        assert_eq!(prepared.document["a"]["c"], json!("public"));
        assert_eq!(prepared.document["a"]["b"]["qualifiers"], doc["a"]["b"]["qualifiers"]);
        assert!(!prepared.document.to_string().contains("secret"));
    }

    #[test]
    fn prepare_does_not_mutate_input() {
        let doc = json!({"x": tagged(json!(5))});
        let snapshot = doc.clone();
        encryptor().prepare(&doc, "t1").unwrap();
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn already_marked_values_are_skipped() {
        let enc = encryptor();
        let doc = json!({"x": tagged(json!(5))});
        let first = enc.prepare(&doc, "t1").unwrap();
        let second = enc.prepare(&first.document, "t1").unwrap();
        assert!(second.records.is_empty());
        assert_eq!(second.document, first.document);
    }

    #[test]
    fn tagged_node_without_value_is_ignored() {
        let doc = json!({"qualifiers": [{"type": "confidentiality", "value": "encrypted"}]});
        let prepared = encryptor().prepare(&doc, "t1").unwrap();
        assert!(prepared.records.is_empty());
        assert_eq!(find_tagged_paths(&doc), Vec::<String>::new());
    }

    #[test]
    fn root_node_can_be_tagged() {
        let enc = encryptor();
        let doc = tagged(json!({"nested": [1, 2]}));
        let prepared = enc.prepare(&doc, "t1").unwrap();
        assert_eq!(prepared.records[0].path, "/value");
        assert_eq!(enc.resolve_prepared(&prepared, "t1").unwrap(), doc);
    }

    #[test]
    fn round_trip_restores_document() {
        let enc = encryptor();
        let doc = json!({
            "submodels": [
                {
                    "idShort": "Carbon",
                    "submodelElements": [tagged(json!(12.5)), tagged(json!(null))]
                },
                {"idShort": "Supplier", "value": tagged(json!({"name": "ACME", "vat": "DE1"}))}
            ]
        });
        let prepared = enc.prepare(&doc, "tenant-a").unwrap();
        assert_eq!(prepared.records.len(), 3);
        assert_eq!(enc.resolve_prepared(&prepared, "tenant-a").unwrap(), doc);
    }

    #[test]
    fn resolve_without_rows_is_a_copy() {
        let doc = json!({"x": {"enc_ref": "dangling"}});
        let out = encryptor().resolve(&doc, "t1", &[], None, None, None).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn resolve_requires_wrapped_dek() {
        let enc = encryptor();
        let prepared = enc.prepare(&json!({"x": tagged(json!(1))}), "t1").unwrap();
        let err = enc
            .resolve(&prepared.document, "t1", &prepared.records, None, prepared.kek_id(), None)
            .unwrap_err();
        assert!(matches!(err, FieldError::MissingDek));
        let err = enc
            .resolve(
                &prepared.document,
                "t1",
                &prepared.records,
                prepared.wrapped_dek(),
                None,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, FieldError::MissingDek));
    }

    #[test]
    fn missing_row_fails() {
        let enc = encryptor();
        let prepared = enc
            .prepare(&json!({"x": tagged(json!(1)), "y": tagged(json!(2))}), "t1")
            .unwrap();
        let err = enc
            .resolve(
                &prepared.document,
                "t1",
                &prepared.records[..1],
                prepared.wrapped_dek(),
                prepared.kek_id(),
                prepared.wrap_algorithm(),
            )
            .unwrap_err();
        assert!(matches!(err, FieldError::MissingRow(r) if r == prepared.records[1].ref_id));
    }

    #[test]
    fn hash_mismatch_detected_before_decryption() {
        let enc = encryptor();
        let mut prepared = enc.prepare(&json!({"x": tagged(json!("v"))}), "t1").unwrap();
        prepared.records[0].ciphertext[0] ^= 0x01;
        let err = enc.resolve_prepared(&prepared, "t1").unwrap_err();
        assert!(matches!(err, FieldError::HashMismatch(_)));
    }

    #[test]
    fn marker_without_hash_still_authenticates() {
        let enc = encryptor();
        let mut prepared = enc.prepare(&json!({"x": tagged(json!("v"))}), "t1").unwrap();
        prepared.document["x"]["value"]
            .as_object_mut()
            .unwrap()
            .remove(MARKER_HASH_KEY);
        assert_eq!(
            enc.resolve_prepared(&prepared, "t1").unwrap(),
            json!({"x": tagged(json!("v"))})
        );

        prepared.records[0].ciphertext[0] ^= 0x01;
        let err = enc.resolve_prepared(&prepared, "t1").unwrap_err();
        assert!(matches!(
            err,
            FieldError::Crypto(dpp_crypto::CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn cross_tenant_resolve_fails() {
        let enc = encryptor();
        let prepared = enc.prepare(&json!({"x": tagged(json!("v"))}), "tenant-a").unwrap();
        let err = enc.resolve_prepared(&prepared, "tenant-b").unwrap_err();
        assert!(matches!(
            err,
            FieldError::Crypto(dpp_crypto::CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn relocated_row_path_fails() {
        let enc = encryptor();
        let mut prepared = enc.prepare(&json!({"x": tagged(json!("v"))}), "t1").unwrap();
        prepared.records[0].path = "/y/value".to_string();
        assert!(enc.resolve_prepared(&prepared, "t1").is_err());
    }

    #[test]
    fn unsupported_field_algorithm_fails() {
        let enc = encryptor();
        let mut prepared = enc.prepare(&json!({"x": tagged(json!("v"))}), "t1").unwrap();
        prepared.records[0].algorithm = "ChaCha20-Poly1305".to_string();
        assert!(matches!(
            enc.resolve_prepared(&prepared, "t1"),
            Err(FieldError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn find_tagged_paths_matches_prepare() {
        let doc = json!({
            "list": [tagged(json!(1)), {"inner": tagged(json!(2))}],
            "plain": {"value": 3}
        });
        let paths = find_tagged_paths(&doc);
        assert_eq!(paths, vec!["/list/0/value", "/list/1/inner/value"]);

        let prepared = encryptor().prepare(&doc, "t1").unwrap();
        let record_paths: Vec<&str> = prepared.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(record_paths, paths);
    }

    #[test]
    fn tags_inside_an_encrypted_value_ride_in_its_ciphertext() {
        let enc = encryptor();
        let doc = json!({"smc": tagged(json!([tagged(json!("inner"))]))});

        assert_eq!(find_tagged_paths(&doc), vec!["/smc/value"]);
        let prepared = enc.prepare(&doc, "t1").unwrap();
        let record_paths: Vec<&str> = prepared.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(record_paths, vec!["/smc/value"]);
        assert!(!prepared.document.to_string().contains("inner"));

        assert_eq!(enc.resolve_prepared(&prepared, "t1").unwrap(), doc);
    }

    #[test]
    fn tags_under_sibling_keys_get_their_own_records() {
        let enc = encryptor();
        let mut outer = tagged(json!(1));
        outer["statements"] = json!([tagged(json!(2))]);
        let doc = json!({"e": outer});

        let expected = vec!["/e/value", "/e/statements/0/value"];
        assert_eq!(find_tagged_paths(&doc), expected);
        let prepared = enc.prepare(&doc, "t1").unwrap();
        let record_paths: Vec<&str> = prepared.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(record_paths, expected);

        assert_eq!(enc.resolve_prepared(&prepared, "t1").unwrap(), doc);
    }

    #[test]
    fn build_field_aad_format() {
        assert_eq!(
            build_field_aad("t1", "/a/value"),
            b"tenant:t1|path:/a/value|enc:1".to_vec()
        );
    }
}

//! Keyring of named KEKs with one active key.
//!
//! Secret token formats:
//! - current: `enc:v2:<key-id>:<base64([IV:12][ciphertext+tag])>`
//! - legacy:  `enc:v1:<base64([IV:12][ciphertext+tag])>` (no key-id, no AAD)
//!
//! New tokens always use the active key. Any key still present in the keyring
//! can decrypt, which is what makes rotation non-disruptive.

use std::collections::BTreeMap;
use std::fmt;

use aes_gcm::Aes256Gcm;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::aad::build_config_field_aad;
use crate::aes_gcm::{cipher_from_key, open_framed, seal_framed};
use crate::base64::{base64_decode, base64_encode};
use crate::config::KeyringConfig;
use crate::dek::{Dek, WrappedDek};
use crate::error::CryptoError;
use crate::types::{
    AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, DEFAULT_KEY_ID, DEK_WRAP_AAD,
    DEK_WRAP_ALGORITHM, SENSITIVE_CONFIG_FIELDS, TOKEN_PREFIX_V1, TOKEN_PREFIX_V2,
};

/// A parsed secret token. Borrows from the token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    V1 { payload: &'a str },
    V2 { key_id: &'a str, payload: &'a str },
}

fn parse_token(token: &str) -> Result<Token<'_>, CryptoError> {
    if let Some(rest) = token.strip_prefix(TOKEN_PREFIX_V2) {
        let (key_id, payload) = rest
            .split_once(':')
            .ok_or(CryptoError::MalformedToken("missing key-id delimiter"))?;
        if key_id.is_empty() {
            return Err(CryptoError::MalformedToken("empty key-id"));
        }
        return Ok(Token::V2 { key_id, payload });
    }
    if let Some(payload) = token.strip_prefix(TOKEN_PREFIX_V1) {
        return Ok(Token::V1 { payload });
    }
    Err(CryptoError::UnsupportedPrefix)
}

fn decode_payload(payload: &str) -> Result<Vec<u8>, CryptoError> {
    let data = base64_decode(payload)?;
    if data.len() < AES_GCM_IV_LENGTH + AES_GCM_TAG_LENGTH {
        return Err(CryptoError::DataTooShort);
    }
    Ok(data)
}

/// True if `value` carries a recognized encrypted-token prefix.
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(TOKEN_PREFIX_V2) || value.starts_with(TOKEN_PREFIX_V1)
}

/// Key-id embedded in a v2 token, if any.
pub fn key_id_of(token: &str) -> Option<&str> {
    match parse_token(token) {
        Ok(Token::V2 { key_id, .. }) => Some(key_id),
        _ => None,
    }
}

/// AES-256-GCM encryptor over an immutable keyring.
///
/// Cheap to share: wrap in `Arc` and call from any thread. A configuration
/// reload builds a new instance.
pub struct KeyringEncryptor {
    keys: BTreeMap<String, Aes256Gcm>,
    active_key_id: String,
}

impl KeyringEncryptor {
    /// Legacy single-key mode. The key is registered under [`DEFAULT_KEY_ID`].
    pub fn from_master_key(master_key_b64: &str) -> Result<Self, CryptoError> {
        Self::from_keyring([(DEFAULT_KEY_ID, master_key_b64)], DEFAULT_KEY_ID)
    }

    /// Build from an explicit keyring of key-id to base64 key.
    ///
    /// If `active_key_id` is not in the keyring, the first entry (by key-id
    /// order) becomes active instead. This is logged at `warn` because it can
    /// hide a misconfigured rotation.
    pub fn from_keyring<I, K, V>(entries: I, active_key_id: &str) -> Result<Self, CryptoError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut keys = BTreeMap::new();
        for (key_id, key_b64) in entries {
            let key_id = key_id.into();
            if key_id.is_empty() || key_id.contains(':') {
                return Err(CryptoError::Config(format!(
                    "invalid key id {key_id:?}: must be non-empty and contain no ':'"
                )));
            }
            let material = Zeroizing::new(base64_decode(key_b64.as_ref()).map_err(|_| {
                CryptoError::Config(format!("key {key_id:?} is not valid base64"))
            })?);
            if material.len() != AES_KEY_LENGTH {
                return Err(CryptoError::Config(format!(
                    "key {key_id:?} must be {AES_KEY_LENGTH} bytes, got {}",
                    material.len()
                )));
            }
            keys.insert(key_id, cipher_from_key(&material)?);
        }

        let first_key_id = keys
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| CryptoError::Config("keyring is empty".to_string()))?;

        let active_key_id = if keys.contains_key(active_key_id) {
            active_key_id.to_string()
        } else {
            warn!(
                requested = active_key_id,
                substituted = %first_key_id,
                "active key id not in keyring, falling back to first entry"
            );
            first_key_id
        };

        debug!(keys = keys.len(), active = %active_key_id, "keyring loaded");
        Ok(Self {
            keys,
            active_key_id,
        })
    }

    /// Build from loaded configuration. An explicit keyring takes precedence
    /// over the single master key.
    pub fn from_config(config: &KeyringConfig) -> Result<Self, CryptoError> {
        if let Some(keyring) = &config.keyring {
            let active = config.active_key_id.as_deref().unwrap_or(DEFAULT_KEY_ID);
            return Self::from_keyring(keyring.iter(), active);
        }
        if let Some(master_key) = &config.master_key {
            return Self::from_master_key(master_key);
        }
        Err(CryptoError::Config(
            "no master key or keyring configured".to_string(),
        ))
    }

    pub fn active_key_id(&self) -> &str {
        &self.active_key_id
    }

    /// Ids of every key in the keyring, in key-id order.
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    fn active_cipher(&self) -> Result<&Aes256Gcm, CryptoError> {
        self.cipher(&self.active_key_id)
    }

    fn cipher(&self, key_id: &str) -> Result<&Aes256Gcm, CryptoError> {
        self.keys
            .get(key_id)
            .ok_or_else(|| CryptoError::UnknownKeyId(key_id.to_string()))
    }

    /// Encrypt raw bytes under the active key into a v2 token.
    pub fn encrypt_bytes(
        &self,
        plaintext: &[u8],
        aad: Option<&[u8]>,
    ) -> Result<String, CryptoError> {
        let framed = seal_framed(self.active_cipher()?, plaintext, aad.unwrap_or_default())?;
        Ok(format!(
            "{TOKEN_PREFIX_V2}{}:{}",
            self.active_key_id,
            base64_encode(&framed)
        ))
    }

    /// Decrypt a v1 or v2 token to raw bytes.
    ///
    /// v2 tokens use the key named in the token and the caller's AAD. v1
    /// tokens carry neither, so every key is tried without AAD.
    pub fn decrypt_bytes(&self, token: &str, aad: Option<&[u8]>) -> Result<Vec<u8>, CryptoError> {
        match parse_token(token)? {
            Token::V2 { key_id, payload } => {
                let cipher = self.cipher(key_id)?;
                let data = decode_payload(payload)?;
                open_framed(cipher, &data, aad.unwrap_or_default())
            }
            Token::V1 { payload } => {
                let data = decode_payload(payload)?;
                let plaintext = self
                    .keys
                    .values()
                    .find_map(|cipher| open_framed(cipher, &data, &[]).ok())
                    .ok_or(CryptoError::DecryptionFailed)?;
                debug!("decrypted legacy v1 token");
                Ok(plaintext)
            }
        }
    }

    /// Encrypt a string under the active key into a v2 token.
    pub fn encrypt(&self, plaintext: &str, aad: Option<&[u8]>) -> Result<String, CryptoError> {
        self.encrypt_bytes(plaintext.as_bytes(), aad)
    }

    /// Decrypt a v1 or v2 token back to a string.
    pub fn decrypt(&self, token: &str, aad: Option<&[u8]>) -> Result<String, CryptoError> {
        let bytes = self.decrypt_bytes(token, aad)?;
        String::from_utf8(bytes).map_err(|e| {
            let mut bytes = e.into_bytes();
            zeroize::Zeroize::zeroize(&mut bytes);
            CryptoError::DecryptionFailed
        })
    }

    /// Re-encrypt `token` under the active key with `aad`.
    ///
    /// The token is always opened with `aad` first, so the result is bound to
    /// it. Tokens already in v2 form under the active key are then returned
    /// as-is. Legacy v1 tokens come back as v2 tokens bound to `aad`.
    pub fn reencrypt(&self, token: &str, aad: Option<&[u8]>) -> Result<String, CryptoError> {
        let plaintext = Zeroizing::new(self.decrypt_bytes(token, aad)?);
        if key_id_of(token) == Some(self.active_key_id.as_str()) {
            return Ok(token.to_string());
        }
        self.encrypt_bytes(&plaintext, aad)
    }

    /// Encrypt the sensitive fields of a connector configuration.
    ///
    /// Only non-empty string values not already carrying a token prefix are
    /// touched, so calling this twice is a no-op the second time.
    pub fn encrypt_config(
        &self,
        config: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CryptoError> {
        let mut out = config.clone();
        for field in SENSITIVE_CONFIG_FIELDS {
            let Some(Value::String(plaintext)) = out.get(*field) else {
                continue;
            };
            if plaintext.is_empty() || is_encrypted(plaintext) {
                continue;
            }
            let aad = build_config_field_aad(field);
            let token = self.encrypt(plaintext, Some(&aad))?;
            out.insert((*field).to_string(), Value::String(token));
        }
        Ok(out)
    }

    /// Decrypt the sensitive fields of a connector configuration.
    pub fn decrypt_config(
        &self,
        config: &Map<String, Value>,
    ) -> Result<Map<String, Value>, CryptoError> {
        let mut out = config.clone();
        for field in SENSITIVE_CONFIG_FIELDS {
            let Some(Value::String(token)) = out.get(*field) else {
                continue;
            };
            if !is_encrypted(token) {
                continue;
            }
            let aad = build_config_field_aad(field);
            let plaintext = self.decrypt(token, Some(&aad))?;
            out.insert((*field).to_string(), Value::String(plaintext));
        }
        Ok(out)
    }

    /// Wrap a 32-byte DEK under the active KEK.
    pub fn wrap_dek(&self, dek: &[u8]) -> Result<WrappedDek, CryptoError> {
        if dek.len() != AES_KEY_LENGTH {
            return Err(CryptoError::InvalidDekLength {
                expected: AES_KEY_LENGTH,
                got: dek.len(),
            });
        }
        let framed = seal_framed(self.active_cipher()?, dek, DEK_WRAP_AAD)?;
        Ok(WrappedDek {
            wrapped: base64_encode(&framed),
            kek_id: self.active_key_id.clone(),
            algorithm: DEK_WRAP_ALGORITHM.to_string(),
        })
    }

    /// Unwrap a DEK produced by [`KeyringEncryptor::wrap_dek`].
    pub fn unwrap_dek(
        &self,
        wrapped: &str,
        kek_id: &str,
        algorithm: &str,
    ) -> Result<Dek, CryptoError> {
        if algorithm != DEK_WRAP_ALGORITHM {
            return Err(CryptoError::UnsupportedWrapAlgorithm(algorithm.to_string()));
        }
        let cipher = self.cipher(kek_id)?;
        let data = decode_payload(wrapped)?;
        let plaintext = Zeroizing::new(open_framed(cipher, &data, DEK_WRAP_AAD)?);
        Dek::from_slice(&plaintext)
    }

    /// Move a wrapped DEK onto the active KEK without touching field data.
    pub fn rewrap_dek(&self, wrapped: &WrappedDek) -> Result<WrappedDek, CryptoError> {
        if wrapped.kek_id == self.active_key_id && wrapped.algorithm == DEK_WRAP_ALGORITHM {
            return Ok(wrapped.clone());
        }
        let dek = self.unwrap_dek(&wrapped.wrapped, &wrapped.kek_id, &wrapped.algorithm)?;
        self.wrap_dek(dek.as_bytes())
    }
}

impl fmt::Debug for KeyringEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringEncryptor")
            .field("key_ids", &self.keys.keys().collect::<Vec<_>>())
            .field("active_key_id", &self.active_key_id)
            .finish()
    }
}

//! Per-document Data Encryption Key (DEK) primitives.
//!
//! Each protected document revision gets a random 256-bit DEK. Tagged field
//! values are encrypted with the DEK, and the DEK itself is wrapped by the
//! active KEK (see [`crate::keyring::KeyringEncryptor::wrap_dek`]).
//!
//! Wrapped DEK wire format: base64([IV:12][AES-256-GCM(KEK, DEK, aad="dek-wrap:v1"):48])

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aes_gcm::{cipher_from_key, open, seal, Sealed};
use crate::error::CryptoError;
use crate::types::AES_KEY_LENGTH;

/// A transient 256-bit data encryption key.
///
/// The buffer is zeroed when the value is dropped, on success, error and
/// unwind alike.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Dek([u8; AES_KEY_LENGTH]);

impl Dek {
    /// Generate a random DEK.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut dek = Dek([0u8; AES_KEY_LENGTH]);
        getrandom::getrandom(&mut dek.0).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
        Ok(dek)
    }

    /// Copy key material out of a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != AES_KEY_LENGTH {
            return Err(CryptoError::InvalidDekLength {
                expected: AES_KEY_LENGTH,
                got: bytes.len(),
            });
        }
        let mut dek = Dek([0u8; AES_KEY_LENGTH]);
        dek.0.copy_from_slice(bytes);
        Ok(dek)
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.0
    }

    /// Encrypt one value under this DEK with a fresh IV.
    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Sealed, CryptoError> {
        let cipher = cipher_from_key(&self.0)?;
        seal(&cipher, plaintext, aad)
    }

    /// Decrypt one value previously produced by [`Dek::seal`].
    pub fn open(
        &self,
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = cipher_from_key(&self.0)?;
        open(&cipher, nonce, ciphertext, aad)
    }
}

impl fmt::Debug for Dek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Dek([REDACTED])")
    }
}

/// A DEK wrapped under a KEK, plus everything needed to unwrap it again.
///
/// All three fields must be persisted together and handed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedDek {
    /// base64([IV:12][ciphertext+tag])
    pub wrapped: String,
    /// Keyring id of the KEK that wrapped the DEK.
    pub kek_id: String,
    /// Wrapping algorithm identifier.
    pub algorithm: String,
}

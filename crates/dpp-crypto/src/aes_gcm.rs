//! AES-256-GCM primitives shared by the keyring and the per-document DEK.
//!
//! Framed layout used by secret tokens and wrapped DEKs:
//! [12 bytes: IV][N bytes: ciphertext + 16-byte tag]

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::error::CryptoError;
use crate::types::{AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH};

/// Output of a single AEAD seal: the nonce and ciphertext kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub nonce: [u8; AES_GCM_IV_LENGTH],
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    /// Concatenate into the framed layout `[IV][ciphertext+tag]`.
    pub fn into_framed(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(AES_GCM_IV_LENGTH + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }
}

/// Generate a random 12-byte IV for AES-GCM.
pub fn generate_iv() -> Result<[u8; AES_GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Build an AES-256-GCM cipher from raw key material.
pub fn cipher_from_key(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
    if key.len() != AES_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: AES_KEY_LENGTH,
            got: key.len(),
        });
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
        expected: AES_KEY_LENGTH,
        got: key.len(),
    })
}

/// Encrypt `plaintext` under a fresh IV, binding `aad`.
///
/// An empty `aad` is equivalent to encrypting without associated data.
pub fn seal(cipher: &Aes256Gcm, plaintext: &[u8], aad: &[u8]) -> Result<Sealed, CryptoError> {
    let iv = generate_iv()?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok(Sealed {
        nonce: iv,
        ciphertext,
    })
}

/// Decrypt a ciphertext produced by [`seal`].
///
/// Every AEAD failure collapses into [`CryptoError::DecryptionFailed`].
pub fn open(
    cipher: &Aes256Gcm,
    nonce: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != AES_GCM_IV_LENGTH {
        return Err(CryptoError::InvalidNonceLength {
            expected: AES_GCM_IV_LENGTH,
            got: nonce.len(),
        });
    }
    if ciphertext.len() < AES_GCM_TAG_LENGTH {
        return Err(CryptoError::DataTooShort);
    }
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Encrypt and return the framed layout `[IV:12][ciphertext+tag]`.
pub fn seal_framed(
    cipher: &Aes256Gcm,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    Ok(seal(cipher, plaintext, aad)?.into_framed())
}

/// Decrypt the framed layout `[IV:12][ciphertext+tag]`.
pub fn open_framed(cipher: &Aes256Gcm, data: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < AES_GCM_IV_LENGTH + AES_GCM_TAG_LENGTH {
        return Err(CryptoError::DataTooShort);
    }
    let (iv, ciphertext) = data.split_at(AES_GCM_IV_LENGTH);
    open(cipher, iv, ciphertext, aad)
}

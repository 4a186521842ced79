//! Keyring encryption for DPP connector secrets and per-document DEKs.

pub mod aad;
pub mod aes_gcm;
pub mod base64;
pub mod config;
pub mod dek;
pub mod error;
pub mod keyring;
pub mod types;

pub use aad::{build_config_field_aad, build_document_field_aad};
pub use aes_gcm::Sealed;
pub use base64::{base64_decode, base64_encode};
pub use config::KeyringConfig;
pub use dek::{Dek, WrappedDek};
pub use error::CryptoError;
pub use keyring::{is_encrypted, key_id_of, KeyringEncryptor};
pub use types::{
    AES_GCM_IV_LENGTH, AES_KEY_LENGTH, DEFAULT_KEY_ID, DEK_WRAP_ALGORITHM, TOKEN_PREFIX_V1,
    TOKEN_PREFIX_V2,
};

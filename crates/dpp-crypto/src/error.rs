use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Keyring configuration error: {0}")]
    Config(String),

    #[error("Invalid base64 payload")]
    InvalidBase64,

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid DEK length: expected {expected} bytes, got {got}")]
    InvalidDekLength { expected: usize, got: usize },

    #[error("Invalid nonce length: expected {expected} bytes, got {got}")]
    InvalidNonceLength { expected: usize, got: usize },

    #[error("Unknown key id: {0}")]
    UnknownKeyId(String),

    #[error("Malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("Encrypted data too short")]
    DataTooShort,

    #[error("Unsupported token prefix")]
    UnsupportedPrefix,

    #[error("Unsupported DEK wrap algorithm: {0}")]
    UnsupportedWrapAlgorithm(String),

    #[error("Encryption failed")]
    EncryptionFailed,

    /// Every AEAD failure: wrong key, wrong AAD or corrupted bytes.
    #[error("Decryption failed: key mismatch, AAD mismatch, or corrupted ciphertext")]
    DecryptionFailed,

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}

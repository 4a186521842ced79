use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Missing wrapped DEK or KEK id for a document with encrypted fields")]
    MissingDek,

    #[error("No encrypted field row for reference {0}")]
    MissingRow(String),

    #[error("Encrypted field hash mismatch for reference {0}")]
    HashMismatch(String),

    #[error("Unsupported field algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Crypto(#[from] dpp_crypto::CryptoError),
}

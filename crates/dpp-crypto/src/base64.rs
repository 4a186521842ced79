use base64ct::{Base64, Encoding};

use crate::error::CryptoError;

/// Base64 encode bytes (standard alphabet, padded).
pub fn base64_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

/// Base64 decode a string to bytes. Surrounding whitespace is ignored.
pub fn base64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    Base64::decode_vec(s.trim()).map_err(|_| CryptoError::InvalidBase64)
}

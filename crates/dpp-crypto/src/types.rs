/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits). Applies to KEKs and DEKs alike.
pub const AES_KEY_LENGTH: usize = 32;

/// Legacy secret token prefix: `enc:v1:<base64(nonce||ciphertext)>`.
///
/// Carries no key-id and was produced without AAD.
pub const TOKEN_PREFIX_V1: &str = "enc:v1:";

/// Current secret token prefix: `enc:v2:<key-id>:<base64(nonce||ciphertext)>`.
pub const TOKEN_PREFIX_V2: &str = "enc:v2:";

/// Key-id used when the encryptor is built from a single master key.
pub const DEFAULT_KEY_ID: &str = "default";

/// Constant AAD bound into every wrapped DEK.
pub const DEK_WRAP_AAD: &[u8] = b"dek-wrap:v1";

/// The only supported DEK wrapping algorithm identifier.
pub const DEK_WRAP_ALGORITHM: &str = "AES-256-GCM";

/// Connector configuration fields whose string values are stored encrypted.
pub const SENSITIVE_CONFIG_FIELDS: &[&str] = &["client_secret", "token"];

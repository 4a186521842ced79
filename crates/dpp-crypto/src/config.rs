//! Keyring configuration loading.
//!
//! Environment variables:
//! - `DPP_ENCRYPTION_MASTER_KEY`: single base64 key (legacy mode)
//! - `DPP_ENCRYPTION_KEYRING`: JSON object of key-id to base64 key
//! - `DPP_ENCRYPTION_ACTIVE_KEY_ID`: key-id used for new encryptions

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::CryptoError;

pub const MASTER_KEY_ENV: &str = "DPP_ENCRYPTION_MASTER_KEY";
pub const KEYRING_ENV: &str = "DPP_ENCRYPTION_KEYRING";
pub const ACTIVE_KEY_ID_ENV: &str = "DPP_ENCRYPTION_ACTIVE_KEY_ID";

#[derive(Clone, Default, Deserialize)]
pub struct KeyringConfig {
    #[serde(default)]
    pub master_key: Option<String>,
    #[serde(default)]
    pub keyring: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub active_key_id: Option<String>,
}

impl KeyringConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, CryptoError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable source (a secret
    /// store client, a test fixture). Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CryptoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let keyring = read(KEYRING_ENV)
            .map(|raw| {
                serde_json::from_str::<BTreeMap<String, String>>(&raw)
                    .map_err(|_| {
                        CryptoError::Config(format!(
                            "{KEYRING_ENV} is not a JSON object of strings"
                        ))
                    })
            })
            .transpose()?;

        Ok(Self {
            master_key: read(MASTER_KEY_ENV).map(|v| v.trim().to_string()),
            keyring,
            active_key_id: read(ACTIVE_KEY_ID_ENV).map(|v| v.trim().to_string()),
        })
    }
}

impl fmt::Debug for KeyringConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringConfig")
            .field("master_key", &self.master_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "keyring",
                &self.keyring.as_ref().map(|k| k.keys().collect::<Vec<_>>()),
            )
            .field("active_key_id", &self.active_key_id)
            .finish()
    }
}

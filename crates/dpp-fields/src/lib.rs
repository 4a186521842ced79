//! Field-level encryption for Digital Product Passport documents.
//!
//! Values whose node carries the `confidentiality: encrypted` qualifier are
//! encrypted under a per-revision DEK and replaced by markers; the DEK is
//! wrapped by the keyring in [`dpp_crypto`].

pub mod canonical;
pub mod encryptor;
pub mod error;
pub mod marker;
pub mod pointer;
pub mod qualifier;
pub mod record;
pub mod walk;

pub use canonical::{canonical_json, parse_canonical};
pub use encryptor::{build_field_aad, find_tagged_paths, DocumentFieldEncryptor};
pub use error::FieldError;
pub use marker::{
    is_marker, marker_hash, Marker, FIELD_ALGORITHM, FIELD_KEY_ID, MARKER_VERSION,
};
pub use pointer::{escape_pointer_segment, join_pointer, split_pointer, unescape_pointer_segment};
pub use qualifier::is_tagged;
pub use record::{EncryptedFieldRecord, PreparedDocument};

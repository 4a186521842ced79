//! Associated-data builders.
//!
//! Config field AAD:   "field:{fieldName}"
//! Document field AAD: "tenant:{tenantId}|path:{pointer}|enc:{markerVersion}"

const CONFIG_FIELD_AAD_PREFIX: &str = "field:";

/// Build AAD for an encrypted connector configuration field.
pub fn build_config_field_aad(field: &str) -> Vec<u8> {
    format!("{}{}", CONFIG_FIELD_AAD_PREFIX, field).into_bytes()
}

/// Build AAD binding a document field ciphertext to its tenant and location.
pub fn build_document_field_aad(tenant_id: &str, pointer: &str, marker_version: &str) -> Vec<u8> {
    format!("tenant:{tenant_id}|path:{pointer}|enc:{marker_version}").into_bytes()
}

//! Identifier encoding for topic segments.
//!
//! AAS identifiers are IRIs or URNs and routinely contain `/`, which would
//! break the topic hierarchy. Following AAS Part 2, identifiers of
//! Identifiables are carried base64url-encoded WITHOUT padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Encode an AAS identifier using base64url without padding.
///
/// # Examples
///
/// ```
/// use aas_eventbridge_proto::encode_id_base64url;
///
/// let encoded = encode_id_base64url("urn:example:aas:asset1");
/// assert!(!encoded.contains('='));
/// assert!(!encoded.contains('/'));
/// ```
#[must_use]
pub fn encode_id_base64url(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

/// Decode a base64url-encoded AAS identifier.
///
/// # Errors
///
/// Returns error if the input is not valid base64url or not UTF-8.
pub fn decode_id_base64url(encoded: &str) -> Result<String, EncodingError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| EncodingError::Base64Decode(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| EncodingError::Utf8Decode(e.to_string()))
}

/// Errors that can occur during decoding.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodingError {
    /// Base64 decoding failed
    #[error("base64 decode error: {0}")]
    Base64Decode(String),
    /// UTF-8 decoding failed
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(String),
}

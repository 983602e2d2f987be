//! HMAC-SHA256 signing and secured API key derivation.
//!
//! A secured key is `base64(hex_signature ++ query_string)`. The service
//! recomputes the signature over the suffix with the parent key and applies
//! the embedded parameters as the effective scope of every request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ClientError;
use crate::query::Query;

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 digest.
pub const SIGNATURE_LEN: usize = 64;

/// Sign `message` with `secret`, returning the lowercase hex digest.
pub fn sign(secret: &str, message: &str) -> Result<String, ClientError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ClientError::configuration(format!("HMAC-SHA256 rejected the signing key: {e}")))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Derive a secured API key restricted to `query`.
///
/// A non-empty `user_token` is merged into the query as `userToken` before
/// encoding.
pub fn generate_secured_api_key(
    private_api_key: &str,
    query: &Query,
    user_token: Option<&str>,
) -> Result<String, ClientError> {
    let query = match user_token.filter(|token| !token.is_empty()) {
        Some(token) => query.clone().user_token(token),
        None => query.clone(),
    };
    encode_signed(private_api_key, &query.to_query_string())
}

/// Legacy derivation from a tag-filter string.
///
/// A string without `=` is a plain tag filter and goes through the structured
/// path as `tagFilters`. A string containing `=` is taken to be a complete
/// query string and is signed as-is, with the user token appended as a
/// percent-encoded `userToken` parameter (a space becomes `%20`).
pub fn generate_secured_api_key_from_tag_filters(
    private_api_key: &str,
    tag_filters: &str,
    user_token: Option<&str>,
) -> Result<String, ClientError> {
    if !tag_filters.contains('=') {
        return generate_secured_api_key(private_api_key, &Query::new().tag_filters(tag_filters), user_token);
    }

    let query_string = match user_token.filter(|token| !token.is_empty()) {
        Some(token) => format!("{tag_filters}&userToken={}", urlencoding::encode(token)),
        None => tag_filters.to_owned(),
    };
    encode_signed(private_api_key, &query_string)
}

fn encode_signed(private_api_key: &str, query_string: &str) -> Result<String, ClientError> {
    let signature = sign(private_api_key, query_string)?;
    Ok(STANDARD.encode(format!("{signature}{query_string}")))
}

/// The two halves of a secured API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuredApiKey {
    pub signature: String,
    pub query_string: String,
}

impl SecuredApiKey {
    /// Split a derived key into signature and query string.
    pub fn decode(key: &str) -> Result<Self, ClientError> {
        let raw = STANDARD
            .decode(key)
            .map_err(|e| ClientError::configuration(format!("secured API key is not valid base64: {e}")))?;
        let text = String::from_utf8(raw)
            .map_err(|e| ClientError::configuration(format!("secured API key is not UTF-8: {e}")))?;

        if text.len() < SIGNATURE_LEN || !text.is_char_boundary(SIGNATURE_LEN) {
            return Err(ClientError::configuration(
                "secured API key is shorter than its signature",
            ));
        }

        let (signature, query_string) = text.split_at(SIGNATURE_LEN);
        Ok(Self {
            signature: signature.to_owned(),
            query_string: query_string.to_owned(),
        })
    }

    /// Recompute the signature with the parent key and compare.
    pub fn verify(&self, private_api_key: &str) -> Result<bool, ClientError> {
        Ok(sign(private_api_key, &self.query_string)? == self.signature)
    }
}

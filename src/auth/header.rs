//! `Authorization` header parsing for bearer tokens and API keys.
//!
//! The header value is split on whitespace and must be exactly
//! `<Scheme> <value>`. Schemes are matched case-sensitively. When a request
//! carries several `Authorization` headers only the first one is read.

use axum::http::{HeaderMap, header};

use super::errors::AuthError;

/// Scheme literal for end-user access and refresh tokens.
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme literal for trusted service API keys.
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    extract_credential(headers, BEARER_SCHEME)
}

/// Extract the key from an `Authorization: ApiKey <key>` header.
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    extract_credential(headers, API_KEY_SCHEME)
}

/// Compare a presented API key with the configured one in constant time.
pub fn check_api_key(key: &str, expected: &str) -> bool {
    use subtle::ConstantTimeEq;
    key.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn extract_credential<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::CredentialMissing)?
        .to_str()
        .map_err(|_| AuthError::CredentialMalformed)?;

    parse_credential(value, scheme)
}

/// Parse `<scheme> <value>` with a strict whitespace tokenizer.
pub fn parse_credential<'a>(value: &'a str, scheme: &str) -> Result<&'a str, AuthError> {
    let mut parts = value.split_ascii_whitespace();

    let first = parts.next().ok_or(AuthError::CredentialMissing)?;
    if first != scheme {
        return Err(AuthError::CredentialMalformed);
    }

    match (parts.next(), parts.next()) {
        (Some(credential), None) => Ok(credential),
        _ => Err(AuthError::CredentialMalformed),
    }
}

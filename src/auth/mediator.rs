//! Caller identification and ownership checks.
//!
//! A mutating request moves through these states:
//!
//! - `Unauthenticated` → bearer extraction or token validation fails → 401
//! - `Authenticated` → caller is not the resource owner → 403
//! - `Authorized` → the operation may proceed

use axum::http::HeaderMap;
use uuid::Uuid;

use super::errors::AuthError;
use super::header::extract_bearer;
use crate::jwt::JwtConfig;

/// Identify the caller from its bearer access token.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtConfig) -> Result<Uuid, AuthError> {
    let token = extract_bearer(headers)?;
    Ok(jwt.validate(token)?)
}

/// Require that `caller` owns the resource owned by `owner`.
pub fn authorize_owner(caller: Uuid, owner: Uuid) -> Result<(), AuthError> {
    if caller == owner {
        Ok(())
    } else {
        tracing::debug!(caller = %caller, owner = %owner, "Ownership mismatch");
        Err(AuthError::OwnershipMismatch)
    }
}

/// Authenticate the caller and require it to be `owner`.
/// Returns the caller id on success.
pub fn authorize_mutation(
    headers: &HeaderMap,
    jwt: &JwtConfig,
    owner: Uuid,
) -> Result<Uuid, AuthError> {
    let caller = authenticate(headers, jwt)?;
    authorize_owner(caller, owner)?;
    Ok(caller)
}

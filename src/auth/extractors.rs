//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::errors::AuthError;
use super::header::{check_api_key, extract_api_key};
use super::mediator::authenticate;
use super::state::{HasAuthBackend, HasWebhookKey};

/// Extractor for endpoints that require a valid bearer access token.
/// Yields the caller's user id.
pub struct BearerAuth(pub Uuid);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state.jwt()).map(BearerAuth)
    }
}

/// Extractor for endpoints called by the trusted payment provider.
/// Requires `Authorization: ApiKey <key>` matching the configured key.
pub struct WebhookAuth;

impl<S> FromRequestParts<S> for WebhookAuth
where
    S: HasWebhookKey + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = extract_api_key(&parts.headers)?;
        if check_api_key(key, state.api_key()) {
            Ok(WebhookAuth)
        } else {
            tracing::debug!("Rejected webhook API key");
            Err(AuthError::ApiKeyRejected)
        }
    }
}

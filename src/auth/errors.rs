//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::JwtError;
use crate::password::PasswordError;

/// Outcome of a failed credential or authorization check.
///
/// Causes are deliberately collapsed: callers only learn which kind of
/// credential failed, never why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no credential presented")]
    CredentialMissing,
    #[error("credential has the wrong scheme or no value")]
    CredentialMalformed,
    #[error("access token is invalid")]
    TokenInvalid,
    #[error("refresh token is invalid")]
    RefreshTokenInvalid,
    #[error("API key does not match")]
    ApiKeyRejected,
    #[error("incorrect email or password")]
    LoginFailed,
    #[error("caller does not own the resource")]
    OwnershipMismatch,
    #[error("upstream failure")]
    UpstreamFailure,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CredentialMissing
            | Self::CredentialMalformed
            | Self::TokenInvalid
            | Self::RefreshTokenInvalid
            | Self::ApiKeyRejected
            | Self::LoginFailed => StatusCode::UNAUTHORIZED,
            Self::OwnershipMismatch => StatusCode::FORBIDDEN,
            Self::UpstreamFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "Not authenticated",
            Self::CredentialMalformed => "Malformed authorization header",
            Self::TokenInvalid => "Invalid or expired token",
            Self::RefreshTokenInvalid => "Invalid refresh token",
            Self::ApiKeyRejected => "Invalid API key",
            Self::LoginFailed => "Incorrect email or password",
            Self::OwnershipMismatch => "Forbidden",
            Self::UpstreamFailure => "Internal error",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Encoding(e) => {
                tracing::error!(error = %e, "Failed to sign access token");
                Self::UpstreamFailure
            }
            JwtError::Decoding(_) | JwtError::Expired | JwtError::InvalidSubject => {
                tracing::debug!(reason = %e, "Rejected access token");
                Self::TokenInvalid
            }
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        tracing::error!(error = %e, "Password backend failure");
        Self::UpstreamFailure
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Store failure");
        Self::UpstreamFailure
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

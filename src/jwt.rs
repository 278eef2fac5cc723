//! Access token issuance and validation.
//!
//! Access tokens are stateless HS256 JWTs carrying only the registered claims
//! `sub`, `iat`, `exp` and `iss`. Nothing is stored server-side, so a token
//! stays valid until `exp` and cannot be revoked early. Long-lived sessions
//! use refresh tokens instead (see [`crate::db::RefreshTokenStore`]).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer label embedded in every access token.
pub const ISSUER: &str = "chirpgate";

/// Default access token lifetime: 1 hour.
pub const ACCESS_TOKEN_DURATION_SECS: i64 = 60 * 60;

/// JWT claims for access tokens. Any claim outside this set is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue an access token for `user_id` that expires `ttl_secs` from now.
    pub fn issue(&self, user_id: Uuid, ttl_secs: i64) -> Result<String, JwtError> {
        self.issue_at(user_id, ttl_secs, now())
    }

    /// Issue an access token as if the current time were `issued_at`.
    ///
    /// A zero or negative `ttl_secs` is accepted and yields a token that is
    /// already expired.
    pub fn issue_at(&self, user_id: Uuid, ttl_secs: i64, issued_at: i64) -> Result<String, JwtError> {
        let claims = AccessClaims {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
            iss: ISSUER.to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    /// Validate an access token and return the user it was issued to.
    pub fn validate(&self, token: &str) -> Result<Uuid, JwtError> {
        self.validate_at(token, now())
    }

    /// Validate an access token against an explicit clock value.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Uuid, JwtError> {
        let claims = self.decode(token)?;

        if now >= claims.exp {
            return Err(JwtError::Expired);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidSubject)
    }

    /// Verify the signature and claim set without checking expiry.
    fn decode(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is compared in `validate_at` so the clock can be supplied.
        validation.validate_exp = false;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "iat", "exp", "iss"]);

        jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::Decoding)
    }
}

/// Current Unix time in seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("Failed to decode token: {0}")]
    Decoding(jsonwebtoken::errors::Error),
    #[error("Token has expired")]
    Expired,
    #[error("Token subject is not a user id")]
    InvalidSubject,
}

//! Refresh token storage.
//!
//! Refresh tokens are opaque random strings. A token is usable while
//! `now < expires_at` and `revoked_at` is unset. Expiry is enforced when a
//! token is looked up; rows are only deleted by the optional sweep.

use rand::RngCore;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::decode_uuid;

/// Entropy of a refresh token in bytes (256 bits).
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new hex-encoded refresh token.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A persisted refresh token. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: i64,
    pub revoked_at: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token: String,
    user_id: String,
    created_at: i64,
    updated_at: i64,
    expires_at: i64,
    revoked_at: Option<i64>,
}

impl TryFrom<RefreshTokenRow> for RefreshToken {
    type Error = sqlx::Error;

    fn try_from(row: RefreshTokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            token: row.token,
            user_id: decode_uuid(&row.user_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        })
    }
}

/// Store for managing refresh tokens.
#[derive(Clone)]
pub struct RefreshTokenStore {
    pool: SqlitePool,
}

impl RefreshTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a new refresh token for a user.
    pub async fn create(
        &self,
        token: &str,
        user_id: Uuid,
        created_at: i64,
        expires_at: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at) VALUES (?, ?, ?, ?, ?, NULL)",
        )
        .bind(token)
        .bind(user_id.to_string())
        .bind(created_at)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a token only if it exists, has not expired at `now` and is not revoked.
    pub async fn get_active(
        &self,
        token: &str,
        now: i64,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            "SELECT token, user_id, created_at, updated_at, expires_at, revoked_at FROM refresh_tokens WHERE token = ? AND expires_at > ? AND revoked_at IS NULL",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RefreshToken::try_from).transpose()
    }

    /// Get a token record regardless of its state.
    pub async fn get(&self, token: &str) -> Result<Option<RefreshToken>, sqlx::Error> {
        let row: Option<RefreshTokenRow> = sqlx::query_as(
            "SELECT token, user_id, created_at, updated_at, expires_at, revoked_at FROM refresh_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RefreshToken::try_from).transpose()
    }

    /// Revoke a usable token. Returns false if the token does not exist,
    /// has expired or was already revoked.
    pub async fn revoke(&self, token: &str, now: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ?, updated_at = ? WHERE token = ? AND expires_at > ? AND revoked_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete tokens that can never be used again (expired or revoked).
    pub async fn delete_unusable(&self, now: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE expires_at <= ? OR revoked_at IS NOT NULL",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

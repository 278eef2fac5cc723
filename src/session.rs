//! Login, refresh and revocation.
//!
//! Login verifies the password, mints an access token and records a new
//! refresh token. Refresh exchanges a usable refresh token for a new access
//! token and leaves the refresh token itself in place. Revocation makes a
//! refresh token permanently unusable.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{error, info};

use crate::auth::AuthError;
use crate::db::{Database, User, generate_refresh_token};
use crate::jwt::{self, ACCESS_TOKEN_DURATION_SECS, JwtConfig};
use crate::password::{hash_password, verify_password};

/// Default refresh token lifetime: 60 days.
pub const REFRESH_TOKEN_DURATION_SECS: i64 = 60 * 24 * 60 * 60;

/// Default bound on a single store round-trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Token lifetimes and store deadline.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub store_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl_secs: ACCESS_TOKEN_DURATION_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_DURATION_SECS,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    jwt: Arc<JwtConfig>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(db: Database, jwt: Arc<JwtConfig>, policy: SessionPolicy) -> Self {
        Self { db, jwt, policy }
    }

    /// Verify email and password, then issue an access and a refresh token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self
            .within_deadline(self.db.users().get_by_email(email))
            .await?
        else {
            spend_verification_time(password);
            return Err(AuthError::LoginFailed);
        };

        if !verify_password(password, &user.hashed_password)? {
            return Err(AuthError::LoginFailed);
        }

        let access_token = self.jwt.issue(user.id, self.policy.access_ttl_secs)?;

        let refresh_token = generate_refresh_token();
        let now = jwt::now();
        self.within_deadline(self.db.refresh_tokens().create(
            &refresh_token,
            user.id,
            now,
            now.saturating_add(self.policy.refresh_ttl_secs),
        ))
        .await?;

        info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a usable refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let record = self
            .within_deadline(self.db.refresh_tokens().get_active(refresh_token, jwt::now()))
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        let access_token = self.jwt.issue(record.user_id, self.policy.access_ttl_secs)?;
        info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a refresh token. Unknown, expired and already revoked tokens
    /// are all reported as `RefreshTokenInvalid`.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let revoked = self
            .within_deadline(self.db.refresh_tokens().revoke(refresh_token, jwt::now()))
            .await?;

        if !revoked {
            return Err(AuthError::RefreshTokenInvalid);
        }
        info!("Refresh token revoked");
        Ok(())
    }

    /// Run a store operation bounded by the configured deadline.
    pub async fn within_deadline<T, F>(&self, operation: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.policy.store_timeout, operation).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => {
                error!(
                    timeout_ms = self.policy.store_timeout.as_millis() as u64,
                    "Store round-trip exceeded deadline"
                );
                Err(AuthError::UpstreamFailure)
            }
        }
    }
}

/// Run one verification against a throwaway digest so an unknown email takes
/// as long to reject as a wrong password.
fn spend_verification_time(password: &str) {
    static DUMMY_DIGEST: OnceLock<Option<String>> = OnceLock::new();

    let digest = DUMMY_DIGEST.get_or_init(|| hash_password("chirpgate-unknown-user").ok());
    if let Some(digest) = digest {
        let _ = verify_password(password, digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn manager_with_user(policy: SessionPolicy) -> (SessionManager, Uuid) {
        let db = Database::open(":memory:").await.unwrap();
        let id = Uuid::new_v4();
        let hash = hash_password("correct horse").unwrap();
        db.users()
            .create(id, "alice@example.com", &hash, jwt::now())
            .await
            .unwrap();

        let jwt = Arc::new(JwtConfig::new(b"session-test-secret"));
        (SessionManager::new(db, jwt, policy), id)
    }

    #[tokio::test]
    async fn test_login_issues_both_tokens() {
        let (sessions, id) = manager_with_user(SessionPolicy::default()).await;

        let outcome = sessions
            .login("alice@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(outcome.user.id, id);
        assert_eq!(sessions.jwt.validate(&outcome.access_token).unwrap(), id);

        let record = sessions
            .db
            .refresh_tokens()
            .get(&outcome.refresh_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.user_id, id);
        assert_eq!(
            record.expires_at - record.created_at,
            REFRESH_TOKEN_DURATION_SECS
        );
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (sessions, _) = manager_with_user(SessionPolicy::default()).await;

        assert_eq!(
            sessions
                .login("alice@example.com", "wrong")
                .await
                .unwrap_err(),
            AuthError::LoginFailed
        );
        assert_eq!(
            sessions
                .login("nobody@example.com", "correct horse")
                .await
                .unwrap_err(),
            AuthError::LoginFailed
        );
    }

    #[tokio::test]
    async fn test_malformed_stored_digest_is_upstream_failure() {
        let (sessions, _) = manager_with_user(SessionPolicy::default()).await;
        sessions
            .db
            .users()
            .create(Uuid::new_v4(), "broken@example.com", "garbage", 0)
            .await
            .unwrap();

        assert_eq!(
            sessions
                .login("broken@example.com", "anything")
                .await
                .unwrap_err(),
            AuthError::UpstreamFailure
        );
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let (sessions, id) = manager_with_user(SessionPolicy::default()).await;
        let outcome = sessions
            .login("alice@example.com", "correct horse")
            .await
            .unwrap();

        let first = sessions.refresh(&outcome.refresh_token).await.unwrap();
        let second = sessions.refresh(&outcome.refresh_token).await.unwrap();
        assert_eq!(sessions.jwt.validate(&first).unwrap(), id);
        assert_eq!(sessions.jwt.validate(&second).unwrap(), id);
    }

    #[tokio::test]
    async fn test_refresh_after_revoke_fails() {
        let (sessions, _) = manager_with_user(SessionPolicy::default()).await;
        let outcome = sessions
            .login("alice@example.com", "correct horse")
            .await
            .unwrap();

        sessions.revoke(&outcome.refresh_token).await.unwrap();
        assert_eq!(
            sessions.refresh(&outcome.refresh_token).await.unwrap_err(),
            AuthError::RefreshTokenInvalid
        );
        assert_eq!(
            sessions.revoke(&outcome.refresh_token).await.unwrap_err(),
            AuthError::RefreshTokenInvalid
        );
    }

    #[tokio::test]
    async fn test_expired_refresh_token_fails() {
        let policy = SessionPolicy {
            refresh_ttl_secs: 0,
            ..SessionPolicy::default()
        };
        let (sessions, _) = manager_with_user(policy).await;
        let outcome = sessions
            .login("alice@example.com", "correct horse")
            .await
            .unwrap();

        assert_eq!(
            sessions.refresh(&outcome.refresh_token).await.unwrap_err(),
            AuthError::RefreshTokenInvalid
        );
    }

    #[tokio::test]
    async fn test_unknown_refresh_token_fails() {
        let (sessions, _) = manager_with_user(SessionPolicy::default()).await;
        assert_eq!(
            sessions
                .refresh(&generate_refresh_token())
                .await
                .unwrap_err(),
            AuthError::RefreshTokenInvalid
        );
        assert_eq!(
            sessions.revoke("not-a-token").await.unwrap_err(),
            AuthError::RefreshTokenInvalid
        );
    }

    #[tokio::test]
    async fn test_store_deadline() {
        let (sessions, _) = manager_with_user(SessionPolicy {
            store_timeout: Duration::from_millis(10),
            ..SessionPolicy::default()
        })
        .await;

        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, sqlx::Error>(())
        };
        assert_eq!(
            sessions.within_deadline(slow).await.unwrap_err(),
            AuthError::UpstreamFailure
        );
    }
}

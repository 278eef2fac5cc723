use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::{decode_timestamp, decode_uuid};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    /// Paid tier, set by the payment provider webhook.
    pub upgraded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    hashed_password: String,
    upgraded: i32,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode_uuid(&row.id)?,
            email: row.email,
            hashed_password: row.hashed_password,
            upgraded: row.upgraded != 0,
            created_at: decode_timestamp(row.created_at)?,
            updated_at: decode_timestamp(row.updated_at)?,
        })
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. Fails with a unique violation if the email is taken.
    pub async fn create(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        now: i64,
    ) -> Result<User, sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, email, hashed_password, upgraded, created_at, updated_at) VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(id.to_string())
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, hashed_password, upgraded, created_at, updated_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, hashed_password, upgraded, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    /// Replace a user's email and password hash. Returns the updated user,
    /// or `None` if no such user exists.
    pub async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
        now: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, hashed_password = ?, updated_at = ? WHERE id = ?",
        )
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Mark a user as upgraded. Returns false if the user does not exist.
    pub async fn upgrade(&self, id: Uuid, now: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET upgraded = 1, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = Database::open(":memory:").await.unwrap();
        let id = Uuid::new_v4();

        let created = db
            .users()
            .create(id, "alice@example.com", "hash", 100)
            .await
            .unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.email, "alice@example.com");
        assert!(!created.upgraded);
        assert_eq!(created.created_at.timestamp(), 100);

        let by_email = db
            .users()
            .get_by_email("ALICE@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.hashed_password, "hash");
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let db = Database::open(":memory:").await.unwrap();
        assert!(
            db.users()
                .get_by_email("nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users()
            .create(Uuid::new_v4(), "alice@example.com", "h", 1)
            .await
            .unwrap();
        let err = db
            .users()
            .create(Uuid::new_v4(), "alice@example.com", "h", 1)
            .await
            .unwrap_err();

        assert!(crate::db::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_update_credentials() {
        let db = Database::open(":memory:").await.unwrap();
        let id = Uuid::new_v4();
        db.users().create(id, "old@example.com", "old", 1).await.unwrap();

        let updated = db
            .users()
            .update_credentials(id, "new@example.com", "new", 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.hashed_password, "new");
        assert_eq!(updated.updated_at.timestamp(), 5);
        assert_eq!(updated.created_at.timestamp(), 1);

        assert!(
            db.users()
                .update_credentials(Uuid::new_v4(), "x@example.com", "x", 5)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_upgrade() {
        let db = Database::open(":memory:").await.unwrap();
        let id = Uuid::new_v4();
        db.users().create(id, "a@example.com", "h", 1).await.unwrap();

        assert!(db.users().upgrade(id, 2).await.unwrap());
        assert!(db.users().get_by_id(id).await.unwrap().unwrap().upgraded);
        assert!(!db.users().upgrade(Uuid::new_v4(), 2).await.unwrap());
    }
}

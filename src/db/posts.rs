//! Post storage.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::{decode_timestamp, decode_uuid};

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub body: String,
    /// Owning user.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing order by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a `sort` query value. Anything other than `desc` is ascending.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: String,
    body: String,
    user_id: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<PostRow> for Post {
    type Error = sqlx::Error;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: decode_uuid(&row.id)?,
            body: row.body,
            user_id: decode_uuid(&row.user_id)?,
            created_at: decode_timestamp(row.created_at)?,
            updated_at: decode_timestamp(row.updated_at)?,
        })
    }
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post owned by `user_id`.
    pub async fn create(&self, user_id: Uuid, body: &str, now: i64) -> Result<Post, sqlx::Error> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO posts (id, body, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(body)
        .bind(user_id.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a post by ID.
    pub async fn get(&self, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, body, user_id, created_at, updated_at FROM posts WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Post::try_from).transpose()
    }

    /// Get the owning user of a post.
    pub async fn get_owner(&self, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT user_id FROM posts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|(user_id,)| decode_uuid(&user_id)).transpose()
    }

    /// List posts, optionally restricted to one author, ordered by creation time.
    pub async fn list(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let sql = match order {
            SortOrder::Asc => {
                "SELECT id, body, user_id, created_at, updated_at FROM posts
                 WHERE (?1 IS NULL OR user_id = ?1)
                 ORDER BY created_at ASC, rowid ASC"
            }
            SortOrder::Desc => {
                "SELECT id, body, user_id, created_at, updated_at FROM posts
                 WHERE (?1 IS NULL OR user_id = ?1)
                 ORDER BY created_at DESC, rowid DESC"
            }
        };

        let rows: Vec<PostRow> = sqlx::query_as(sql)
            .bind(author.map(|id| id.to_string()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Post::try_from).collect()
    }

    /// Delete a post. Returns true if a row was removed.
    ///
    /// Ownership must already have been checked by the caller.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

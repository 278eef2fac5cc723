//! Posts API.
//!
//! Reading is public. Creating requires a bearer access token, deleting
//! additionally requires the caller to own the post.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ApiError, ResultExt, parse_uuid};
use crate::auth::{BearerAuth, authorize_mutation};
use crate::db::{Database, Post, SortOrder, is_foreign_key_violation};
use crate::impl_has_auth_backend;
use crate::jwt::{self, JwtConfig};

/// Maximum post length in characters.
pub const MAX_POST_LENGTH: usize = 140;

/// Words replaced by [`CENSOR_MASK`], compared case-insensitively.
const FLAGGED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const CENSOR_MASK: &str = "****";

/// State for posts endpoints.
#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(PostsState);

pub fn router(state: PostsState) -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).delete(delete_post))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CreatePostRequest {
    body: String,
}

#[derive(Deserialize)]
struct ListQuery {
    author_id: Option<String>,
    sort: Option<String>,
}

#[derive(Serialize)]
struct PostResponse {
    id: Uuid,
    body: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            body: post.body,
            user_id: post.user_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

// --- Helpers ---

/// Replace flagged words with a mask. Words are separated by single spaces;
/// a word with punctuation attached is left as is.
fn censor(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if FLAGGED_WORDS.contains(&lowered.as_str()) {
                CENSOR_MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// --- Handlers ---

async fn create_post(
    State(state): State<PostsState>,
    BearerAuth(caller): BearerAuth,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::bad_request("Post cannot be empty"));
    }

    if payload.body.chars().count() > MAX_POST_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Post cannot be longer than {} characters",
            MAX_POST_LENGTH
        )));
    }

    let post = match state
        .db
        .posts()
        .create(caller, &censor(&payload.body), jwt::now())
        .await
    {
        Ok(post) => post,
        // A validly signed token can outlive its user row.
        Err(e) if is_foreign_key_violation(&e) => {
            return Err(ApiError::not_found("User not found"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create post", e)),
    };

    info!(user_id = %caller, post_id = %post.id, "Post created");
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

async fn list_posts(
    State(state): State<PostsState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let author = query.author_id.as_deref().map(parse_uuid).transpose()?;

    let posts = state
        .db
        .posts()
        .list(author, SortOrder::from_query(query.sort.as_deref()))
        .await
        .db_err("Failed to list posts")?;

    Ok(Json(
        posts.into_iter().map(PostResponse::from).collect::<Vec<_>>(),
    ))
}

async fn get_post(
    State(state): State<PostsState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id)?;

    let post = state
        .db
        .posts()
        .get(id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    Ok(Json(PostResponse::from(post)))
}

async fn delete_post(
    State(state): State<PostsState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id)?;

    let owner = state
        .db
        .posts()
        .get_owner(id)
        .await
        .db_err("Failed to get post owner")?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let caller = authorize_mutation(&headers, &state.jwt, owner)?;

    let deleted = state
        .db
        .posts()
        .delete(id)
        .await
        .db_err("Failed to delete post")?;

    if !deleted {
        return Err(ApiError::not_found("Post not found"));
    }

    info!(user_id = %caller, post_id = %id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

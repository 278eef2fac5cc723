use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::ApiError;
use crate::auth::{AuthError, BearerAuth};
use crate::db::{Database, User, is_unique_violation};
use crate::impl_has_auth_backend;
use crate::jwt::{self, JwtConfig};
use crate::password::hash_password;

const MAX_EMAIL_LENGTH: usize = 254;
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/", post(create_user).put(update_user))
        .with_state(state)
}

#[derive(Deserialize)]
struct CredentialsRequest {
    email: String,
    password: String,
}

/// Public view of a user. Never includes the password hash.
#[derive(Serialize)]
pub(super) struct UserResponse {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    upgraded: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            upgraded: user.upgraded,
        }
    }
}

/// Validate submitted credentials and return the trimmed email.
fn validate_credentials(payload: &CredentialsRequest) -> Result<&str, ApiError> {
    let email = payload.email.trim();

    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }

    if email.len() > MAX_EMAIL_LENGTH || !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    Ok(email)
}

async fn create_user(
    State(state): State<UsersState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_credentials(&payload)?;
    let hashed = hash_password(&payload.password).map_err(AuthError::from)?;

    let user = match state
        .db
        .users()
        .create(Uuid::new_v4(), email, &hashed, jwt::now())
        .await
    {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

async fn update_user(
    State(state): State<UsersState>,
    BearerAuth(caller): BearerAuth,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validate_credentials(&payload)?;
    let hashed = hash_password(&payload.password).map_err(AuthError::from)?;

    let updated = match state
        .db
        .users()
        .update_credentials(caller, email, &hashed, jwt::now())
        .await
    {
        Ok(updated) => updated,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to update user", e)),
    };

    let user = updated.ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = %user.id, "User credentials updated");
    Ok(Json(UserResponse::from(&user)))
}

//! Login, refresh and revoke endpoints.
//!
//! `/refresh` and `/revoke` take the refresh token as `Authorization: Bearer`.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::users::UserResponse;
use crate::auth::extract_bearer;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct SessionState {
    pub sessions: SessionManager,
}

pub fn router(state: SessionState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/revoke", post(revoke))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    #[serde(flatten)]
    user: UserResponse,
    token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    token: String,
}

async fn login(
    State(state): State<SessionState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .sessions
        .login(payload.email.trim(), &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(&outcome.user),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

async fn refresh(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = extract_bearer(&headers)?;
    let token = state.sessions.refresh(refresh_token).await?;
    Ok(Json(RefreshResponse { token }))
}

async fn revoke(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = extract_bearer(&headers)?;
    state.sessions.revoke(refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

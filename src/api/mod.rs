mod error;
mod posts;
mod session;
mod users;
mod webhooks;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::session::SessionManager;

pub use error::ApiError;
pub use posts::MAX_POST_LENGTH;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    sessions: SessionManager,
    api_key: Arc<str>,
) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let posts_state = posts::PostsState {
        db: db.clone(),
        jwt,
    };

    let session_state = session::SessionState { sessions };

    let webhooks_state = webhooks::WebhooksState { db, api_key };

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/users", users::router(users_state))
        .nest("/posts", posts::router(posts_state))
        .nest("/webhooks", webhooks::router(webhooks_state))
        .merge(session::router(session_state))
}

async fn healthz() -> &'static str {
    "OK"
}

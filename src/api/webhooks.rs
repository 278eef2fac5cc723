//! Payment provider webhooks.
//!
//! The provider authenticates with `Authorization: ApiKey <key>`. Only the
//! `user.upgraded` event has an effect; any other event is acknowledged so the
//! provider stops retrying.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ApiError, ResultExt, parse_uuid};
use crate::auth::{HasWebhookKey, WebhookAuth};
use crate::db::Database;
use crate::jwt;

const UPGRADE_EVENT: &str = "user.upgraded";

#[derive(Clone)]
pub struct WebhooksState {
    pub db: Database,
    pub api_key: Arc<str>,
}

impl HasWebhookKey for WebhooksState {
    fn api_key(&self) -> &str {
        &self.api_key
    }
}

pub fn router(state: WebhooksState) -> Router {
    Router::new()
        .route("/upgrades", post(handle_upgrade))
        .with_state(state)
}

#[derive(Deserialize)]
struct WebhookRequest {
    #[serde(default)]
    event: String,
    #[serde(default)]
    data: WebhookData,
}

#[derive(Deserialize, Default)]
struct WebhookData {
    #[serde(default)]
    user_id: String,
}

async fn handle_upgrade(
    State(state): State<WebhooksState>,
    _auth: WebhookAuth,
    Json(payload): Json<WebhookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.event != UPGRADE_EVENT {
        debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = parse_uuid(&payload.data.user_id)?;

    let upgraded = state
        .db
        .users()
        .upgrade(user_id, jwt::now())
        .await
        .db_err("Failed to upgrade user")?;

    if !upgraded {
        return Err(ApiError::not_found("User not found"));
    }

    info!(user_id = %user_id, "User upgraded");
    Ok(StatusCode::NO_CONTENT)
}

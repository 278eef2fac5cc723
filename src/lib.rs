pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod metrics;
pub mod password;
pub mod session;

use api::create_api_router;
use axum::{Router, middleware};
use db::Database;
use jwt::JwtConfig;
use metrics::{HitCounter, count_hits};
use session::{SessionManager, SessionPolicy};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing access tokens
    pub jwt_secret: Vec<u8>,
    /// Shared key the payment provider presents on webhooks
    pub api_key: String,
    /// Token lifetimes and store deadline
    pub policy: SessionPolicy,
    /// Interval of the refresh token sweep, disabled when `None`
    pub sweep_interval: Option<Duration>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));
    let sessions = SessionManager::new(config.db.clone(), jwt.clone(), config.policy);
    let hits = HitCounter::default();

    let api_router = create_api_router(
        config.db.clone(),
        jwt,
        sessions,
        Arc::from(config.api_key.as_str()),
    )
    .layer(middleware::from_fn_with_state(hits.clone(), count_hits));

    Router::new()
        .nest("/api", api_router)
        .nest("/admin", metrics::router(hits))
        .layer(TraceLayer::new_for_http())
}

/// Spawn the refresh token sweep if one is configured.
/// Call this before starting the server.
pub fn init_cleanup(config: &ServerConfig) -> Option<tokio::task::JoinHandle<()>> {
    config
        .sweep_interval
        .map(|interval| cleanup::spawn_cleanup_scheduler(config.db.clone(), interval))
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to enable the sweep.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    init_cleanup(&config);

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}

//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::session::SessionPolicy;
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

const JWT_SECRET_ENV: &str = "JWT_SECRET";
const API_KEY_ENV: &str = "POLKA_KEY";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "chirpgate",
    about = "Short-post API with token authentication"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CHIRPGATE_PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file, or ":memory:"
    #[arg(short, long, env = "CHIRPGATE_DATABASE", default_value = "chirpgate.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Path to file containing the webhook API key. Prefer using POLKA_KEY env var instead
    #[arg(long)]
    pub api_key_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "CHIRPGATE_ACCESS_TTL_SECS", default_value = "3600")]
    pub access_ttl_secs: i64,

    /// Refresh token lifetime in days
    #[arg(long, env = "CHIRPGATE_REFRESH_TTL_DAYS", default_value = "60")]
    pub refresh_ttl_days: i64,

    /// Deadline for a single store round-trip in milliseconds
    #[arg(long, env = "CHIRPGATE_STORE_TIMEOUT_MS", default_value = "5000")]
    pub store_timeout_ms: u64,

    /// Delete expired and revoked refresh tokens every N seconds (off by default)
    #[arg(long, env = "CHIRPGATE_SWEEP_INTERVAL_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval_secs: Option<u64>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Read a secret from the environment, falling back to a file.
/// The environment variable is removed once read.
fn load_secret(env_var: &str, file: Option<&str>) -> Result<Option<String>, String> {
    if let Ok(secret) = std::env::var(env_var) {
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        return Ok(Some(secret));
    }

    match file {
        Some(path) => std::fs::read_to_string(path)
            .map(|content| Some(content.trim().to_string()))
            .map_err(|e| format!("Failed to read {}: {}", path, e)),
        None => Ok(None),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = match load_secret(JWT_SECRET_ENV, jwt_secret_file) {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            error!(
                "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
            );
            return None;
        }
        Err(e) => {
            error!(error = %e, "Failed to load JWT secret");
            return None;
        }
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load the webhook API key from environment variable or file.
/// Returns None and logs an error if the key is missing or empty.
pub fn load_api_key(api_key_file: Option<&str>) -> Option<String> {
    match load_secret(API_KEY_ENV, api_key_file) {
        Ok(Some(key)) if !key.trim().is_empty() => Some(key.trim().to_string()),
        Ok(Some(_)) => {
            error!("Webhook API key is empty");
            None
        }
        Ok(None) => {
            error!(
                "Webhook API key is required. Set POLKA_KEY environment variable (recommended) or use --api-key-file"
            );
            None
        }
        Err(e) => {
            error!(error = %e, "Failed to load webhook API key");
            None
        }
    }
}

/// Build the session policy from the lifetime and deadline flags.
/// Returns None and logs an error if a value is out of range.
pub fn build_policy(args: &Args) -> Option<SessionPolicy> {
    let Some(refresh_ttl_secs) = args.refresh_ttl_days.checked_mul(24 * 60 * 60) else {
        error!(days = args.refresh_ttl_days, "Refresh token lifetime is too large");
        return None;
    };

    Some(SessionPolicy {
        access_ttl_secs: args.access_ttl_secs,
        refresh_ttl_secs,
        store_timeout: Duration::from_millis(args.store_timeout_ms),
    })
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    jwt_secret: String,
    api_key: String,
    policy: SessionPolicy,
    sweep_interval_secs: Option<u64>,
) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        api_key,
        policy,
        sweep_interval: sweep_interval_secs.map(Duration::from_secs),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

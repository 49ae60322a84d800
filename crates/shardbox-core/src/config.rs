//! Configuration module
//!
//! Environment-driven configuration for the API binary. Everything has a
//! development-friendly default except the blob backend endpoint, which the
//! core genuinely cannot run without.

use std::env;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_UPLOAD_THROTTLE_MS: u64 = 1500;
const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 60;
const DEFAULT_METADATA_PATH: &str = "data/metadata";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Directory holding one JSON document per file identifier.
    pub metadata_path: String,
    /// Base URL of the remote blob backend.
    pub blob_backend_url: String,
    /// Bearer token for the blob backend, when it requires one.
    pub blob_backend_token: Option<String>,
    /// Bounded timeout applied to every backend call.
    pub blob_backend_timeout_secs: u64,
    /// Blanket delay imposed before every backend upload, on top of whatever
    /// rate-limit waits the backend demands.
    pub upload_throttle_ms: u64,
    pub heartbeat_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let blob_backend_url = env::var("BLOB_BACKEND_URL")
            .map_err(|_| anyhow::anyhow!("BLOB_BACKEND_URL environment variable not set"))?;

        Ok(Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_origins,
            environment,
            metadata_path: env::var("METADATA_PATH")
                .unwrap_or_else(|_| DEFAULT_METADATA_PATH.to_string()),
            blob_backend_url,
            blob_backend_token: env::var("BLOB_BACKEND_TOKEN").ok(),
            blob_backend_timeout_secs: env::var("BLOB_BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS),
            upload_throttle_ms: env::var("UPLOAD_THROTTLE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_UPLOAD_THROTTLE_MS),
            heartbeat_interval_secs: env::var("HEARTBEAT_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_SECS),
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

//! Server configuration loaded from environment variables.
//!
//! Built once in `main` and injected through `AppState`; request paths never
//! touch the environment.  Secrets are required: loading fails, and the
//! process exits non-zero, when any of them is absent.

use std::net::SocketAddr;
use std::path::PathBuf;

use ed25519_dalek::SigningKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credentials for the SMS verification provider.
#[derive(Clone)]
pub struct TwilioConfig {
    /// Env: `TWILIO_ACCOUNT_SID`
    pub account_sid: String,
    /// Env: `TWILIO_AUTH_TOKEN`
    pub auth_token: String,
    /// Env: `TWILIO_VERIFY_SERVICE_SID`
    pub verify_service_sid: String,
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3001`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.
    /// Env: `DATABASE_PATH`
    /// Default: `./hobbyist.db`
    pub database_path: PathBuf,

    /// Filesystem path where uploaded images are stored.
    /// Env: `IMAGE_STORAGE_PATH`
    /// Default: `./uploads`
    pub image_storage_path: PathBuf,

    /// Base URL prefixed onto served image ids.
    /// Env: `PUBLIC_BASE_URL`
    /// Default: `http://localhost:3001`
    pub public_base_url: String,

    /// Ed25519 key that signs session tokens, derived from a 64-char hex
    /// seed.  Env: `SESSION_SIGNING_KEY` (required).
    pub signing_key: SigningKey,

    /// SMS provider credentials (all required).
    pub twilio: TwilioConfig,

    /// Whether to seed demo data into an empty database.
    /// Env: `SEED_DEMO_DATA` (true/false)
    /// Default: `false`
    pub seed_demo_data: bool,

    /// Maximum accepted image upload size in bytes (10 MiB).
    pub max_image_size: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional settings fall back to defaults; missing or malformed
    /// secrets are a hard error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut http_addr: SocketAddr = ([0, 0, 0, 0], 3001).into();
        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./hobbyist.db"));

        let image_storage_path = std::env::var("IMAGE_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());

        let seed = parse_hex_key("SESSION_SIGNING_KEY", &require("SESSION_SIGNING_KEY")?)?;
        let signing_key = SigningKey::from_bytes(&seed);

        let twilio = TwilioConfig {
            account_sid: require("TWILIO_ACCOUNT_SID")?,
            auth_token: require("TWILIO_AUTH_TOKEN")?,
            verify_service_sid: require("TWILIO_VERIFY_SERVICE_SID")?,
        };

        let seed_demo_data = std::env::var("SEED_DEMO_DATA")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            http_addr,
            database_path,
            image_storage_path,
            public_base_url,
            signing_key,
            twilio,
            seed_demo_data,
            max_image_size: 10 * 1024 * 1024, // 10 MiB
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Parse a 64-character hex string into a 32-byte key.
fn parse_hex_key(name: &'static str, hex_str: &str) -> Result<[u8; 32], ConfigError> {
    let hex_str = hex_str.trim();
    if hex_str.len() != 64 {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("expected 64 hex chars, got {}", hex_str.len()),
        });
    }

    let bytes = hex::decode(hex_str).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

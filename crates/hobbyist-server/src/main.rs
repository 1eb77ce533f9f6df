//! # hobbyist-server
//!
//! REST API backend for the Hobbyist mobile app.
//!
//! This binary provides:
//! - **Phone verification** via an external SMS provider, exchanged for a
//!   signed 7-day session token
//! - **Auth gate** validating the token on every protected request
//! - **Hobby browsing and the join workflow** (transactional membership)
//! - **Activity feed, per-hobby chat and a notification inbox**
//! - **Image upload** serving hosted URLs for profiles, hobbies and posts

mod auth;
mod config;
mod error;
mod images;
mod routes;
mod seed;
mod session;
mod state;
mod throttle;
mod verify;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hobbyist_store::Database;

use crate::config::ServerConfig;
use crate::images::ImageStore;
use crate::session::SessionIssuer;
use crate::state::AppState;
use crate::throttle::SmsThrottle;
use crate::verify::{TwilioVerify, VerificationProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hobbyist_server=debug")),
        )
        .init();

    info!("Starting Hobbyist server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration.  Missing secrets abort startup here -- a server
    //    that cannot sign tokens or reach the SMS provider must not run.
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env()?;
    info!(
        addr = %config.http_addr,
        database = %config.database_path.display(),
        images = %config.image_storage_path.display(),
        base_url = %config.public_base_url,
        seed_demo_data = config.seed_demo_data,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let mut db = Database::open_at(&config.database_path)?;
    if config.seed_demo_data {
        seed::seed_demo_data(&mut db)?;
    }

    let images = Arc::new(
        ImageStore::new(config.image_storage_path.clone(), config.max_image_size).await?,
    );

    let sessions = Arc::new(SessionIssuer::new(config.signing_key.clone()));
    let verifying_key = sessions.verifying_key();

    let verifier: Arc<dyn VerificationProvider> =
        Arc::new(TwilioVerify::new(config.twilio.clone()));

    let sms_throttle = SmsThrottle::default();

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        verifier,
        sessions,
        verifying_key,
        images,
        sms_throttle: sms_throttle.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic throttle cleanup (every 5 minutes, evict buckets idle >10 min)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            sms_throttle.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = routes::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

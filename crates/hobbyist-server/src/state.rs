//! Application state shared across all request handlers.
//!
//! Built once in `main` and cloned into the router; configuration and
//! secrets travel through here instead of ambient environment lookups.

use std::sync::Arc;

use ed25519_dalek::VerifyingKey;
use tokio::sync::Mutex;

use hobbyist_store::Database;

use crate::config::ServerConfig;
use crate::images::ImageStore;
use crate::session::SessionIssuer;
use crate::throttle::SmsThrottle;
use crate::verify::VerificationProvider;

#[derive(Clone)]
pub struct AppState {
    /// The embedded database.  rusqlite is synchronous, so handlers take
    /// the lock only for the duration of a query.
    pub db: Arc<Mutex<Database>>,

    /// SMS verification provider (Twilio in production, in-memory in tests).
    pub verifier: Arc<dyn VerificationProvider>,

    /// Mints session tokens after approved verifications.
    pub sessions: Arc<SessionIssuer>,

    /// Public half of the session signing key, used by the auth gate.
    pub verifying_key: VerifyingKey,

    /// Uploaded-image storage.
    pub images: Arc<ImageStore>,

    /// Per-phone throttle for verification sends.
    pub sms_throttle: SmsThrottle,

    /// Full server configuration.
    pub config: Arc<ServerConfig>,
}

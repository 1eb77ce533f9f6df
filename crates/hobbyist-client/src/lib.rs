//! # hobbyist-client
//!
//! Client-side session library for the Hobbyist app: the mobile shell
//! embeds this crate and keeps the UI a thin rendering layer.
//!
//! It provides:
//! - **On-device persistence** of the session token and the last-fetched
//!   profile snapshot, under two fixed keys
//! - a typed **API client** over the REST surface
//! - the **session manager** driving boot routing
//!   (splash → auth → profile-setup → main)
//! - a **chat thread** model with optimistic sends and poll merging

pub mod api;
pub mod chat;
pub mod session;
pub mod storage;

mod error;

pub use api::ApiClient;
pub use chat::ChatThread;
pub use error::ClientError;
pub use session::{profile_complete, AppRoute, SessionManager};
pub use storage::DeviceStore;

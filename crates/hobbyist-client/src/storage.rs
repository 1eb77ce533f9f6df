//! On-device persistence for the session.
//!
//! A single JSON file in the platform data directory holds exactly two
//! fixed keys: the session token and the last-fetched profile snapshot.
//! The mobile shell maps this onto its secure keystore; on desktop it is
//! a plain file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::Value;

use hobbyist_shared::types::UserProfile;

use crate::error::ClientError;

/// Storage key for the persisted session token.
pub const TOKEN_KEY: &str = "user_session_token";
/// Storage key for the cached profile snapshot.
pub const PROFILE_KEY: &str = "user_profile_snapshot";

pub struct DeviceStore {
    path: PathBuf,
}

impl DeviceStore {
    /// Open the default per-user store.
    pub fn new() -> Result<Self, ClientError> {
        let project_dirs =
            ProjectDirs::from("com", "hobbyist", "hobbyist").ok_or(ClientError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(Self::open_at(&data_dir.join("session.json")))
    }

    /// Open a store at an explicit path (tests point this at a temp dir).
    pub fn open_at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    // ------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------

    pub fn token(&self) -> Option<String> {
        self.load()
            .get(TOKEN_KEY)
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    pub fn set_token(&self, token: &str) -> Result<(), ClientError> {
        self.set(TOKEN_KEY, Value::String(token.to_string()))
    }

    pub fn profile(&self) -> Option<UserProfile> {
        let map = self.load();
        let value = map.get(PROFILE_KEY)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn set_profile(&self, profile: &UserProfile) -> Result<(), ClientError> {
        self.set(PROFILE_KEY, serde_json::to_value(profile)?)
    }

    /// Remove both keys (logout).
    pub fn clear(&self) -> Result<(), ClientError> {
        let mut map = self.load();
        map.remove(TOKEN_KEY);
        map.remove(PROFILE_KEY);
        self.save(&map)
    }

    // ------------------------------------------------------------------
    // File plumbing
    // ------------------------------------------------------------------

    /// A missing or corrupt file reads as empty -- the session simply looks
    /// logged-out.
    fn load(&self) -> BTreeMap<String, Value> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "corrupt session store, treating as empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), ClientError> {
        let mut map = self.load();
        map.insert(key.to_string(), value);
        self.save(&map)
    }

    fn save(&self, map: &BTreeMap<String, Value>) -> Result<(), ClientError> {
        let json = serde_json::to_vec_pretty(map)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

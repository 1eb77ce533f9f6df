//! Session lifecycle: boot, login, logout and derived routing.
//!
//! Boot sequence: load any persisted token, then fetch a fresh profile
//! with it.  Any fetch failure clears the persisted state -- fail-safe
//! logout, never fail-open.

use hobbyist_shared::types::UserProfile;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::storage::DeviceStore;

/// Which top-level screen the shell should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRoute {
    Splash,
    Auth,
    ProfileSetup,
    Main,
}

/// Whether a profile counts as complete.
///
/// Deliberate policy, not an accident: completeness is exactly "a
/// non-blank nickname is set", so a user who clears their nickname is
/// reclassified as incomplete and routed back through profile setup.
pub fn profile_complete(profile: Option<&UserProfile>) -> bool {
    profile
        .and_then(|p| p.nickname.as_deref())
        .map(|nickname| !nickname.trim().is_empty())
        .unwrap_or(false)
}

pub struct SessionManager {
    api: ApiClient,
    store: DeviceStore,
    loading: bool,
    token: Option<String>,
    profile: Option<UserProfile>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: DeviceStore) -> Self {
        Self {
            api,
            store,
            loading: true,
            token: None,
            profile: None,
        }
    }

    /// Run once at app start.
    pub async fn bootstrap(&mut self) -> Result<(), ClientError> {
        self.token = self.store.token();

        if self.token.is_some() {
            if let Err(e) = self.refresh_profile().await {
                tracing::warn!(error = %e, "profile fetch failed on boot, logging out");
            }
        }

        self.loading = false;
        Ok(())
    }

    /// Persist a freshly-issued token and fetch the profile behind it.
    pub async fn login_success(&mut self, token: String) -> Result<(), ClientError> {
        self.store.set_token(&token)?;
        self.token = Some(token);
        self.refresh_profile().await
    }

    /// Re-fetch `/api/users/me`; on any failure the session is cleared.
    pub async fn refresh_profile(&mut self) -> Result<(), ClientError> {
        let Some(token) = self.token.clone() else {
            self.profile = None;
            return Ok(());
        };

        match self.api.me(&token).await {
            Ok(profile) => {
                self.store.set_profile(&profile)?;
                self.profile = Some(profile);
                Ok(())
            }
            Err(e) => {
                self.logout()?;
                Err(e)
            }
        }
    }

    /// Clear persisted token and cached profile synchronously.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.store.clear()?;
        self.token = None;
        self.profile = None;
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_profile_complete(&self) -> bool {
        profile_complete(self.profile.as_ref())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Derive the current screen from session state.
    pub fn route(&self) -> AppRoute {
        if self.loading {
            AppRoute::Splash
        } else if !self.is_logged_in() {
            AppRoute::Auth
        } else if !self.is_profile_complete() {
            AppRoute::ProfileSetup
        } else {
            AppRoute::Main
        }
    }
}

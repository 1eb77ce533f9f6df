//! Session issuance: approved phone number -> user row -> signed token.

use ed25519_dalek::{SigningKey, VerifyingKey};

use hobbyist_shared::token::issue_session_token;
use hobbyist_shared::types::UserProfile;
use hobbyist_store::Database;

use crate::error::ApiError;

/// Holds the server signing key and turns verified phone numbers into
/// sessions.
pub struct SessionIssuer {
    signing_key: SigningKey,
}

impl SessionIssuer {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Public half of the signing key, for the auth gate.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Look up or create the user for an approved phone number, then mint
    /// a 7-day token.
    ///
    /// The user write and the token minting are independent steps: if
    /// minting fails the row persists, and a retry simply finds it again
    /// (creation is idempotent on the phone-number unique index).
    pub fn login(
        &self,
        db: &Database,
        phone_number: &str,
    ) -> Result<(UserProfile, String), ApiError> {
        let user = db.find_or_create_user(phone_number)?;

        let token = issue_session_token(user.id, &user.phone_number, &self.signing_key)
            .map_err(|e| ApiError::Internal(format!("token minting failed: {e}")))?;

        tracing::info!(user = %user.id, "session issued");
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobbyist_shared::token::verify_session_token;
    use rand::rngs::OsRng;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn login_creates_then_reuses_user() {
        let (db, _dir) = test_db();
        let issuer = SessionIssuer::new(SigningKey::generate(&mut OsRng));

        let (first, token) = issuer.login(&db, "+15551234567").unwrap();
        assert!(!token.is_empty());

        let (second, _) = issuer.login(&db, "+15551234567").unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn issued_token_resolves_to_the_user() {
        let (db, _dir) = test_db();
        let issuer = SessionIssuer::new(SigningKey::generate(&mut OsRng));

        let (user, token) = issuer.login(&db, "+15551234567").unwrap();
        let claims = verify_session_token(&token, &issuer.verifying_key()).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.phone_number, "+15551234567");
    }
}

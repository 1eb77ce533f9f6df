//! Signed session tokens.
//!
//! A session token binds a user id and phone number for a fixed window
//! (7 days).  The server signs the claims with its Ed25519 key and the
//! auth middleware verifies signature and expiry on every request.  The
//! encoded form is URL-safe base64 of the serialized [`SessionToken`], so
//! it travels as a single opaque `Bearer` string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Sessions expire this many days after issuance.
pub const SESSION_TTL_DAYS: i64 = 7;

/// The identity a token proves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub phone_number: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims plus the server's signature over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    pub claims: SessionClaims,
    pub signature: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not valid base64/JSON")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

// payload = user_id bytes || phone_number || expires_at (rfc3339)
fn signing_payload(claims: &SessionClaims) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(claims.user_id.as_bytes());
    payload.extend_from_slice(claims.phone_number.as_bytes());
    payload.extend_from_slice(claims.expires_at.to_rfc3339().as_bytes());
    payload
}

/// Mint a token for `user_id`/`phone_number`, valid for [`SESSION_TTL_DAYS`].
pub fn issue_session_token(
    user_id: Uuid,
    phone_number: &str,
    signing_key: &SigningKey,
) -> Result<String, TokenError> {
    let claims = SessionClaims {
        user_id,
        phone_number: phone_number.to_string(),
        expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
    };
    sign_claims(claims, signing_key)
}

/// Sign explicit claims.  Split out so tests can mint already-expired tokens.
pub fn sign_claims(claims: SessionClaims, signing_key: &SigningKey) -> Result<String, TokenError> {
    let signature = signing_key.sign(&signing_payload(&claims));
    let token = SessionToken {
        claims,
        signature: signature.to_bytes().to_vec(),
    };
    let json = serde_json::to_vec(&token).map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode and verify an encoded token.
///
/// Expiry is checked before the signature; either failure is surfaced to
/// clients identically (a 401), so a forged token and a stale one are
/// indistinguishable from the outside.
pub fn verify_session_token(
    encoded: &str,
    verifying_key: &VerifyingKey,
) -> Result<SessionClaims, TokenError> {
    let raw = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| TokenError::Malformed)?;
    let token: SessionToken = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

    if Utc::now() > token.claims.expires_at {
        return Err(TokenError::Expired);
    }

    let signature = Signature::from_slice(&token.signature).map_err(|_| TokenError::BadSignature)?;
    verifying_key
        .verify(&signing_payload(&token.claims), &signature)
        .map_err(|_| TokenError::BadSignature)?;

    Ok(token.claims)
}

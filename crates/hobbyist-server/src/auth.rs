//! Bearer-token auth gate.
//!
//! Stateless and side-effect-free: no refresh, no revocation list.  All
//! three rejection paths answer 401; an expired token and a forged one are
//! indistinguishable from the client's side.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use ed25519_dalek::VerifyingKey;
use uuid::Uuid;

use hobbyist_shared::token::verify_session_token;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity resolved by the gate, injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub phone_number: String,
}

/// Middleware applied to every protected route.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(req.headers(), &state.verifying_key)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn authenticate(headers: &HeaderMap, key: &VerifyingKey) -> Result<AuthUser, ApiError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::Auth("Access denied: no token.".to_string()));
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Auth("Access denied: malformed header.".to_string()))?;

    let claims = verify_session_token(token, key).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        ApiError::Auth("Access denied: invalid token.".to_string())
    })?;

    Ok(AuthUser {
        user_id: claims.user_id,
        phone_number: claims.phone_number,
    })
}

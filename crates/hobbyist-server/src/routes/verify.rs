//! Phone verification endpoints: send a code, check it, issue a session.

use axum::extract::State;
use axum::Json;

use hobbyist_shared::types::{
    SendCodeRequest, SendCodeResponse, VerifyCodeRequest, VerifyCodeResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/twilio/send-code`
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    let phone = req.phone_number.trim();
    if phone.is_empty() {
        return Err(ApiError::Validation("Phone number is required.".to_string()));
    }

    if !state.sms_throttle.check(phone).await {
        tracing::warn!(phone = %phone, "verification send throttled");
        return Err(ApiError::RateLimited(
            "Too many verification codes requested for this number. Try again shortly.".to_string(),
        ));
    }

    let outcome = state.verifier.start_verification(phone).await?;
    tracing::info!(phone = %phone, status = %outcome.status, "verification started");

    Ok(Json(SendCodeResponse {
        status: outcome.status,
    }))
}

/// `POST /api/twilio/verify-code`
///
/// On an approved check this is the login path: the user row is looked up
/// or created and a fresh 7-day token is returned.
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, ApiError> {
    let phone = req.phone_number.trim();
    let code = req.code.trim();
    if phone.is_empty() || code.is_empty() {
        return Err(ApiError::Validation(
            "Phone number and code are required.".to_string(),
        ));
    }

    let outcome = state.verifier.check_verification(phone, code).await?;
    if !outcome.approved() {
        tracing::info!(phone = %phone, status = %outcome.status, "verification not approved");
        return Err(ApiError::Validation(
            "The verification code is incorrect or has expired.".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let (_user, token) = state.sessions.login(&db, phone)?;

    Ok(Json(VerifyCodeResponse {
        success: true,
        message: "Verification successful!".to_string(),
        token,
    }))
}

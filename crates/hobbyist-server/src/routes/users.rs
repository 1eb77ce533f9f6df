//! The caller's own profile and joined-hobby list.

use axum::extract::State;
use axum::{Extension, Json};

use hobbyist_shared::types::{Hobby, MeResponse, UpdateProfileRequest, UpdateProfileResponse};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/users/me`
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let db = state.db.lock().await;
    // A deleted user can still hold a valid token; that reads as 404.
    let profile = db.get_user(user.user_id)?;
    Ok(Json(MeResponse { user: profile }))
}

/// `PATCH /api/users/me` -- fields absent from the body stay untouched.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let db = state.db.lock().await;
    let profile = db.update_profile(user.user_id, &update)?;

    tracing::info!(user = %user.user_id, "profile updated");
    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: profile,
    }))
}

/// `GET /api/users/me/hobbies`
pub async fn my_hobbies(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Hobby>>, ApiError> {
    let db = state.db.lock().await;
    db.get_user(user.user_id)?;
    let hobbies = db.list_joined_hobbies(user.user_id)?;
    Ok(Json(hobbies))
}

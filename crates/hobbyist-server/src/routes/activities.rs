//! Activity feed endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use hobbyist_shared::types::{ActivityPost, CreateActivityRequest};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_id;
use crate::state::AppState;

/// `GET /api/activities` -- the global feed, newest first.
pub async fn feed(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Vec<ActivityPost>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_activity_feed()?))
}

/// `GET /api/activities/me` -- the caller's own posts, newest first.
pub async fn my_posts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ActivityPost>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_activities_by_author(user.user_id)?))
}

/// `POST /api/activities` -- hobby id in the body; text is optional when an
/// image is attached.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityPost>), ApiError> {
    let hobby_id = req
        .hobby_id
        .ok_or_else(|| ApiError::Validation("hobbyId is required.".to_string()))?;

    let content = req.content.unwrap_or_default();
    if content.trim().is_empty() && req.image_url.is_none() {
        return Err(ApiError::Validation(
            "Content or image is required.".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let post = db.create_activity(hobby_id, user.user_id, &content, req.image_url.as_deref())?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `POST /api/activities/{hobbyId}` -- hobby id in the path; text required.
pub async fn create_in_hobby(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(hobby_id): Path<String>,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityPost>), ApiError> {
    let hobby_id = parse_id(&hobby_id)?;

    let content = req.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ApiError::Validation("Content is required.".to_string()));
    }

    let db = state.db.lock().await;
    let post = db.create_activity(hobby_id, user.user_id, &content, req.image_url.as_deref())?;
    Ok((StatusCode::CREATED, Json(post)))
}

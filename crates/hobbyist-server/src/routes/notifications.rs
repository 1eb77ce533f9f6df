//! Notification inbox endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use hobbyist_shared::types::{MarkReadResponse, Notification};
use hobbyist_store::StoreError;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_id;
use crate::state::AppState;

/// `GET /api/notifications` -- the caller's inbox, newest first.
pub async fn inbox(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_notifications(user.user_id)?))
}

/// `PUT /api/notifications/{id}/read`
///
/// Flips the read flag.  A notification that does not exist and one that
/// belongs to someone else both answer 404.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let id = parse_id(&id)?;
    let db = state.db.lock().await;

    let notification = db.mark_notification_read(id, user.user_id).map_err(|e| match e {
        StoreError::NotFound => {
            ApiError::NotFound("Notification not found or not yours.".to_string())
        }
        other => other.into(),
    })?;

    Ok(Json(MarkReadResponse {
        message: "Notification marked as read.".to_string(),
        notification,
    }))
}

//! Per-hobby chat.  No realtime push; clients poll the GET endpoint.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use hobbyist_shared::types::{ChatMessage, PostMessageRequest};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_id;
use crate::state::AppState;

/// `GET /api/chat/{hobbyId}/messages` -- oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    Path(hobby_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let hobby_id = parse_id(&hobby_id)?;
    let db = state.db.lock().await;
    Ok(Json(db.list_chat_messages(hobby_id)?))
}

/// `POST /api/chat/{hobbyId}/messages`
pub async fn post_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(hobby_id): Path<String>,
    Json(req): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let hobby_id = parse_id(&hobby_id)?;
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("Content is required.".to_string()));
    }

    let db = state.db.lock().await;
    let message = db.insert_chat_message(hobby_id, user.user_id, &req.content)?;
    Ok((StatusCode::CREATED, Json(message)))
}

//! Image upload and serving.

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use hobbyist_shared::types::UploadResponse;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_id;
use crate::state::AppState;

/// `POST /api/upload/image` -- multipart with an `image` field; responds
/// with the hosted URL clients put into profiles, hobbies and posts.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "image" {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read field: {e}")))?;

            let id = state.images.store_image(&data).await?;
            let image_url = state.images.public_url(&state.config.public_base_url, id);

            tracing::info!(id = %id, user = %user.user_id, size = data.len(), "image uploaded");

            return Ok(Json(UploadResponse {
                message: "Image uploaded!".to_string(),
                image_url,
            }));
        }
    }

    Err(ApiError::Validation(
        "No image file was provided.".to_string(),
    ))
}

/// `GET /api/upload/image/{id}` -- serves stored bytes with the sniffed
/// content type.  Public: image URLs are embedded in unauthenticated
/// browse responses.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let (data, content_type) = state.images.get_image(id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

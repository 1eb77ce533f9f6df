use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use hobbyist_store::StoreError;

/// The failure taxonomy every route handler converts into.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed or invalid session token.
    #[error("{0}")]
    Auth(String),

    /// A referenced entity is absent.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate join.  Rendered as 400, not 409 -- the mobile client only
    /// distinguishes 4xx from 5xx.
    #[error("{0}")]
    Conflict(String),

    /// Too many SMS sends for one phone number.
    #[error("{0}")]
    RateLimited(String),

    /// External SMS/storage provider failure.
    #[error("{0}")]
    Provider(String),

    /// Uncaught database or logic failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ApiError::Provider(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            ApiError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Record not found.".to_string()),
            StoreError::AlreadyMember => {
                ApiError::Conflict("You have already joined this hobby.".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

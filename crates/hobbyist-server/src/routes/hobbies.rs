//! Hobby browsing, creation and the join workflow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use hobbyist_shared::geo::DEFAULT_NEARBY_RADIUS_M;
use hobbyist_shared::types::{
    ActivityPost, CreateHobbyRequest, GeoPoint, Hobby, JoinHobbyResponse, MemberProfile,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_id;
use crate::state::AppState;

/// Per-hobby activity preview size.
const HOBBY_ACTIVITY_LIMIT: u32 = 5;
/// Sample sizes for the browse endpoints.
const RECOMMENDED_LIMIT: u32 = 4;
const NEARBY_FALLBACK_LIMIT: u32 = 2;

/// `GET /api/hobbies`
pub async fn list_hobbies(State(state): State<AppState>) -> Result<Json<Vec<Hobby>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_hobbies()?))
}

/// `GET /api/hobbies/recommended`
pub async fn recommended(State(state): State<AppState>) -> Result<Json<Vec<Hobby>>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_limited(RECOMMENDED_LIMIT)?))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    radius: Option<f64>,
}

/// `GET /api/hobbies/nearby?lat=..&lon=..&radius=..`
///
/// Without coordinates this degrades to a small sample, matching what the
/// mobile client expects when location permission is denied.
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<Hobby>>, ApiError> {
    let db = state.db.lock().await;

    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Ok(Json(db.list_limited(NEARBY_FALLBACK_LIMIT)?));
    };

    let origin = GeoPoint {
        longitude: lon,
        latitude: lat,
    };
    let radius = query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_M);
    Ok(Json(db.list_nearby(origin, radius)?))
}

/// `GET /api/hobbies/{id}`
pub async fn hobby_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Hobby>, ApiError> {
    let id = parse_id(&id)?;
    let db = state.db.lock().await;
    Ok(Json(db.get_hobby(id)?))
}

/// `GET /api/hobbies/{id}/activities`
pub async fn hobby_activities(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActivityPost>>, ApiError> {
    let id = parse_id(&id)?;
    let db = state.db.lock().await;
    Ok(Json(db.list_activities_for_hobby(id, HOBBY_ACTIVITY_LIMIT)?))
}

/// `GET /api/hobbies/{id}/members`
pub async fn hobby_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MemberProfile>>, ApiError> {
    let id = parse_id(&id)?;
    let db = state.db.lock().await;
    Ok(Json(db.list_hobby_members(id)?))
}

/// `POST /api/hobbies`
pub async fn create_hobby(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateHobbyRequest>,
) -> Result<(StatusCode, Json<Hobby>), ApiError> {
    if req.name.trim().is_empty()
        || req.category.trim().is_empty()
        || req.description.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Name, category and description are required.".to_string(),
        ));
    }

    let mut db = state.db.lock().await;
    let hobby = db.create_hobby(user.user_id, &req)?;
    Ok((StatusCode::CREATED, Json(hobby)))
}

/// `POST /api/hobbies/{id}/join`
pub async fn join_hobby(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<JoinHobbyResponse>, ApiError> {
    let id = parse_id(&id)?;
    let mut db = state.db.lock().await;
    db.join_hobby(id, user.user_id)?;

    Ok(Json(JoinHobbyResponse {
        message: "Joined the hobby!".to_string(),
    }))
}

//! Route assembly.
//!
//! Handlers are grouped by domain in the sub-modules; this module builds
//! the router, layering the auth gate onto every protected route.

pub mod activities;
pub mod chat;
pub mod hobbies;
pub mod notifications;
pub mod upload;
pub mod users;
pub mod verify;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::{middleware, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::error::ApiError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // multipart framing adds overhead on top of the image itself
    let body_limit = state.config.max_image_size + 1024 * 1024;

    let public = Router::new()
        .route("/", get(root_banner))
        .route("/health", get(health_check))
        .route("/api/twilio/send-code", post(verify::send_code))
        .route("/api/twilio/verify-code", post(verify::verify_code))
        .route("/api/hobbies", get(hobbies::list_hobbies))
        .route("/api/hobbies/recommended", get(hobbies::recommended))
        .route("/api/hobbies/nearby", get(hobbies::nearby))
        .route("/api/hobbies/{id}", get(hobbies::hobby_detail))
        .route("/api/hobbies/{id}/activities", get(hobbies::hobby_activities))
        .route("/api/hobbies/{id}/members", get(hobbies::hobby_members))
        .route("/api/upload/image/{id}", get(upload::serve_image));

    let protected = Router::new()
        .route("/api/users/me", get(users::me).patch(users::update_me))
        .route("/api/users/me/hobbies", get(users::my_hobbies))
        .route("/api/hobbies", post(hobbies::create_hobby))
        .route("/api/hobbies/{id}/join", post(hobbies::join_hobby))
        .route("/api/activities", get(activities::feed).post(activities::create))
        .route("/api/activities/me", get(activities::my_posts))
        .route("/api/activities/{hobbyId}", post(activities::create_in_hobby))
        .route(
            "/api/chat/{hobbyId}/messages",
            get(chat::list_messages).post(chat::post_message),
        )
        .route("/api/notifications", get(notifications::inbox))
        .route("/api/notifications/{id}/read", put(notifications::mark_read))
        .route("/api/upload/image", post(upload::upload_image))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse a path segment into an entity id.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("Invalid id.".to_string()))
}

async fn root_banner() -> &'static str {
    "Hobbyist server is running!"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use hobbyist_shared::types::{NotificationKind, RelatedEntity};
    use hobbyist_store::notifications::NewNotification;
    use hobbyist_store::Database;

    use crate::config::{ServerConfig, TwilioConfig};
    use crate::images::ImageStore;
    use crate::session::SessionIssuer;
    use crate::throttle::SmsThrottle;
    use crate::verify::{ProviderError, VerificationOutcome, VerificationProvider};

    /// In-memory provider: any phone, one fixed code.
    struct StaticVerifier {
        code: &'static str,
    }

    #[async_trait]
    impl VerificationProvider for StaticVerifier {
        async fn start_verification(
            &self,
            _phone_number: &str,
        ) -> Result<VerificationOutcome, ProviderError> {
            Ok(VerificationOutcome {
                status: "pending".into(),
                valid: false,
            })
        }

        async fn check_verification(
            &self,
            _phone_number: &str,
            code: &str,
        ) -> Result<VerificationOutcome, ProviderError> {
            if code == self.code {
                Ok(VerificationOutcome {
                    status: "approved".into(),
                    valid: true,
                })
            } else {
                Ok(VerificationOutcome {
                    status: "pending".into(),
                    valid: false,
                })
            }
        }
    }

    const TEST_CODE: &str = "123456";

    async fn setup() -> (Router, AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();

        let signing_key = SigningKey::generate(&mut OsRng);
        let config = ServerConfig {
            http_addr: ([127, 0, 0, 1], 0).into(),
            database_path: dir.path().join("test.db"),
            image_storage_path: dir.path().join("uploads"),
            public_base_url: "http://test.local".into(),
            signing_key: signing_key.clone(),
            twilio: TwilioConfig {
                account_sid: "AC000".into(),
                auth_token: "secret".into(),
                verify_service_sid: "VA000".into(),
            },
            seed_demo_data: false,
            max_image_size: 1024 * 1024,
        };

        let sessions = Arc::new(SessionIssuer::new(signing_key));
        let verifying_key = sessions.verifying_key();
        let images = Arc::new(
            ImageStore::new(config.image_storage_path.clone(), config.max_image_size)
                .await
                .unwrap(),
        );

        let state = AppState {
            db: Arc::new(Mutex::new(db)),
            verifier: Arc::new(StaticVerifier { code: TEST_CODE }),
            sessions,
            verifying_key,
            images,
            // generous buckets so tests never trip the throttle
            sms_throttle: SmsThrottle::new(1000.0, 1000.0),
            config: Arc::new(config),
        };

        (build_router(state.clone()), state, dir)
    }

    async fn request(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Run the full verification flow for a phone number, returning the token.
    async fn login(app: &Router, phone: &str) -> String {
        let (status, _) = request(
            app,
            "POST",
            "/api/twilio/send-code",
            None,
            Some(json!({ "phoneNumber": phone })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = request(
            app,
            "POST",
            "/api/twilio/verify-code",
            None,
            Some(json!({ "phoneNumber": phone, "code": TEST_CODE })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_and_banner() {
        let (app, _state, _dir) = setup().await;

        let (status, body) = request(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = request(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn verification_flow_issues_token() {
        let (app, _state, _dir) = setup().await;

        let (status, body) = request(
            &app,
            "POST",
            "/api/twilio/send-code",
            None,
            Some(json!({ "phoneNumber": "+15551234567" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");

        // wrong code: approval failure, no token
        let (status, body) = request(
            &app,
            "POST",
            "/api/twilio/verify-code",
            None,
            Some(json!({ "phoneNumber": "+15551234567", "code": "000000" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("token").is_none());

        // correct code: token comes back and opens /me
        let token = login(&app, "+15551234567").await;
        assert!(!token.is_empty());

        let (status, body) = request(&app, "GET", "/api/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["phoneNumber"], "+15551234567");
    }

    #[tokio::test]
    async fn missing_phone_number_is_rejected() {
        let (app, _state, _dir) = setup().await;

        let (status, _) = request(
            &app,
            "POST",
            "/api/twilio/send-code",
            None,
            Some(json!({ "phoneNumber": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn auth_gate_distinguishes_rejection_reasons() {
        let (app, _state, _dir) = setup().await;

        let (status, body) = request(&app, "GET", "/api/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("no token"));

        let req = Request::builder()
            .method("GET")
            .uri("/api/users/me")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("malformed header"));

        let (status, body) =
            request(&app, "GET", "/api/users/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("invalid token"));
    }

    #[tokio::test]
    async fn profile_update_round_trips() {
        let (app, _state, _dir) = setup().await;
        let token = login(&app, "+15551234567").await;

        let (status, body) = request(
            &app,
            "PATCH",
            "/api/users/me",
            Some(&token),
            Some(json!({ "nickname": "Alex" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["nickname"], "Alex");

        let (status, body) = request(&app, "GET", "/api/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["nickname"], "Alex");
    }

    #[tokio::test]
    async fn create_and_join_hobby_flow() {
        let (app, _state, _dir) = setup().await;
        let creator = login(&app, "+15551234567").await;
        let joiner = login(&app, "+15557654321").await;

        let (status, hobby) = request(
            &app,
            "POST",
            "/api/hobbies",
            Some(&creator),
            Some(json!({
                "name": "Chess Club",
                "category": "Games",
                "description": "Casual chess every week"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(hobby["memberCount"], 1);
        let hobby_id = hobby["id"].as_str().unwrap().to_string();

        // creator's joined list gained exactly one entry
        let (_, body) = request(&app, "GET", "/api/users/me", Some(&creator), None).await;
        assert_eq!(body["user"]["joinedHobbies"].as_array().unwrap().len(), 1);

        let (status, _) = request(
            &app,
            "POST",
            &format!("/api/hobbies/{hobby_id}/join"),
            Some(&joiner),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, members) = request(
            &app,
            "GET",
            &format!("/api/hobbies/{hobby_id}/members"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(members.as_array().unwrap().len(), 2);

        let (_, detail) = request(&app, "GET", &format!("/api/hobbies/{hobby_id}"), None, None).await;
        assert_eq!(detail["memberCount"], 2);
    }

    #[tokio::test]
    async fn duplicate_join_conflicts_and_never_double_counts() {
        let (app, _state, _dir) = setup().await;
        let creator = login(&app, "+15551234567").await;
        let joiner = login(&app, "+15557654321").await;

        let (_, hobby) = request(
            &app,
            "POST",
            "/api/hobbies",
            Some(&creator),
            Some(json!({
                "name": "Chess Club",
                "category": "Games",
                "description": "Casual chess every week"
            })),
        )
        .await;
        let hobby_id = hobby["id"].as_str().unwrap().to_string();
        let join_uri = format!("/api/hobbies/{hobby_id}/join");

        let (status, _) = request(&app, "POST", &join_uri, Some(&joiner), None).await;
        assert_eq!(status, StatusCode::OK);

        // racing duplicate attempts: all must conflict, none may count
        let mut handles = Vec::new();
        for _ in 0..8 {
            let app = app.clone();
            let joiner = joiner.clone();
            let join_uri = join_uri.clone();
            handles.push(tokio::spawn(async move {
                request(&app, "POST", &join_uri, Some(&joiner), None).await.0
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::BAD_REQUEST);
        }

        let (_, detail) = request(&app, "GET", &format!("/api/hobbies/{hobby_id}"), None, None).await;
        assert_eq!(detail["memberCount"], 2);
        let (_, body) = request(&app, "GET", "/api/users/me", Some(&joiner), None).await;
        assert_eq!(body["user"]["joinedHobbies"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn join_unknown_hobby_is_not_found() {
        let (app, _state, _dir) = setup().await;
        let token = login(&app, "+15551234567").await;

        let (status, _) = request(
            &app,
            "POST",
            &format!("/api/hobbies/{}/join", Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn activity_validation_and_feed_order() {
        let (app, _state, _dir) = setup().await;
        let token = login(&app, "+15551234567").await;

        let (_, hobby) = request(
            &app,
            "POST",
            "/api/hobbies",
            Some(&token),
            Some(json!({
                "name": "Chess Club",
                "category": "Games",
                "description": "Casual chess every week"
            })),
        )
        .await;
        let hobby_id = hobby["id"].as_str().unwrap().to_string();

        // neither content nor image
        let (status, _) = request(
            &app,
            "POST",
            "/api/activities",
            Some(&token),
            Some(json!({ "hobbyId": hobby_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = request(
            &app,
            "POST",
            "/api/activities",
            Some(&token),
            Some(json!({ "hobbyId": hobby_id, "content": "first post" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // image alone is enough
        let (status, _) = request(
            &app,
            "POST",
            "/api/activities",
            Some(&token),
            Some(json!({ "hobbyId": hobby_id, "imageUrl": "http://test.local/pic" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, newest) = request(
            &app,
            "POST",
            &format!("/api/activities/{hobby_id}"),
            Some(&token),
            Some(json!({ "content": "latest post" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, feed) = request(&app, "GET", "/api/activities", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let feed = feed.as_array().unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0]["id"], newest["id"]);

        let (_, mine) = request(&app, "GET", "/api/activities/me", Some(&token), None).await;
        assert_eq!(mine.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn nearby_without_coordinates_degrades_to_sample() {
        let (app, _state, _dir) = setup().await;
        let token = login(&app, "+15551234567").await;

        for i in 0..4 {
            let (status, _) = request(
                &app,
                "POST",
                "/api/hobbies",
                Some(&token),
                Some(json!({
                    "name": format!("Club {i}"),
                    "category": "Games",
                    "description": "desc",
                    "location": { "longitude": -118.24 + f64::from(i), "latitude": 34.05 }
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = request(&app, "GET", "/api/hobbies/nearby", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = request(
            &app,
            "GET",
            "/api/hobbies/nearby?lat=34.05&lon=-118.24&radius=5000",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn chat_round_trip() {
        let (app, _state, _dir) = setup().await;
        let token = login(&app, "+15551234567").await;

        let (_, hobby) = request(
            &app,
            "POST",
            "/api/hobbies",
            Some(&token),
            Some(json!({
                "name": "Chess Club",
                "category": "Games",
                "description": "Casual chess every week"
            })),
        )
        .await;
        let hobby_id = hobby["id"].as_str().unwrap().to_string();
        let uri = format!("/api/chat/{hobby_id}/messages");

        let (status, _) = request(
            &app,
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "content": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for content in ["hello", "anyone here?"] {
            let (status, _) = request(
                &app,
                "POST",
                &uri,
                Some(&token),
                Some(json!({ "content": content })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, messages) = request(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let messages = messages.as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "hello");
    }

    #[tokio::test]
    async fn notifications_inbox_and_read_toggle() {
        let (app, state, _dir) = setup().await;
        let token = login(&app, "+15551234567").await;
        let other = login(&app, "+15557654321").await;

        // written by server-side business logic, not a route
        let notification = {
            let db = state.db.lock().await;
            let user = db.get_user_by_phone("+15551234567").unwrap();
            db.insert_notification(&NewNotification {
                user_id: user.id,
                kind: NotificationKind::JoinRequest,
                message: "Someone joined your club".into(),
                avatar_url: None,
                related: Some(RelatedEntity::Hobby(Uuid::new_v4())),
            })
            .unwrap()
        };

        let (status, inbox) = request(&app, "GET", "/api/notifications", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let inbox = inbox.as_array().unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0]["read"], false);
        assert_eq!(inbox[0]["related"]["kind"], "hobby");

        let read_uri = format!("/api/notifications/{}/read", notification.id);

        // someone else's token cannot flip it
        let (status, _) = request(&app, "PUT", &read_uri, Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = request(&app, "PUT", &read_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notification"]["read"], true);
    }

    #[tokio::test]
    async fn image_upload_and_serve() {
        let (app, _state, _dir) = setup().await;
        let token = login(&app, "+15551234567").await;

        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&[0u8; 16]);

        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"pic.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&png);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/upload/image")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        let image_url = body["imageUrl"].as_str().unwrap();
        assert!(image_url.starts_with("http://test.local/api/upload/image/"));

        // fetch it back through the serving endpoint (public)
        let path = image_url.trim_start_matches("http://test.local");
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/png"
        );
        let served = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(served.as_ref(), png.as_slice());
    }

    #[tokio::test]
    async fn send_code_is_throttled_per_number() {
        let (app, state, _dir) = setup().await;

        // replace the generous test throttle with a tight one
        let app = build_router(AppState {
            sms_throttle: SmsThrottle::new(1.0 / 20.0, 2.0),
            ..state
        });

        for _ in 0..2 {
            let (status, _) = request(
                &app,
                "POST",
                "/api/twilio/send-code",
                None,
                Some(json!({ "phoneNumber": "+15551234567" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = request(
            &app,
            "POST",
            "/api/twilio/send-code",
            None,
            Some(json!({ "phoneNumber": "+15551234567" })),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        // a different number is unaffected
        let (status, _) = request(
            &app,
            "POST",
            "/api/twilio/send-code",
            None,
            Some(json!({ "phoneNumber": "+15557654321" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

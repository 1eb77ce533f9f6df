//! Typed client for the Hobbyist REST surface.
//!
//! Thin wrappers around `reqwest`: every non-2xx response is parsed into
//! the server's `{"error"}` body and surfaced as [`ClientError::Api`].

use serde::de::DeserializeOwned;
use uuid::Uuid;

use hobbyist_shared::types::{
    ActivityPost, ChatMessage, CreateActivityRequest, CreateHobbyRequest, ErrorBody, Hobby,
    JoinHobbyResponse, MarkReadResponse, MeResponse, Notification, PostMessageRequest,
    SendCodeRequest, SendCodeResponse, UpdateProfileRequest, UpdateProfileResponse,
    UploadResponse, UserProfile, VerifyCodeRequest, VerifyCodeResponse,
};

use crate::error::ClientError;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("server returned {status}"));
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    // ------------------------------------------------------------------
    // Verification / login
    // ------------------------------------------------------------------

    pub async fn send_code(&self, phone_number: &str) -> Result<SendCodeResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/api/twilio/send-code"))
            .json(&SendCodeRequest {
                phone_number: phone_number.to_string(),
            })
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn verify_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<VerifyCodeResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/api/twilio/verify-code"))
            .json(&VerifyCodeRequest {
                phone_number: phone_number.to_string(),
                code: code.to_string(),
            })
            .send()
            .await?;
        Self::handle(response).await
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    pub async fn me(&self, token: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .http
            .get(self.url("/api/users/me"))
            .bearer_auth(token)
            .send()
            .await?;
        let body: MeResponse = Self::handle(response).await?;
        Ok(body.user)
    }

    pub async fn update_profile(
        &self,
        token: &str,
        update: &UpdateProfileRequest,
    ) -> Result<UserProfile, ClientError> {
        let response = self
            .http
            .patch(self.url("/api/users/me"))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;
        let body: UpdateProfileResponse = Self::handle(response).await?;
        Ok(body.user)
    }

    pub async fn my_hobbies(&self, token: &str) -> Result<Vec<Hobby>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/users/me/hobbies"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // ------------------------------------------------------------------
    // Hobbies
    // ------------------------------------------------------------------

    pub async fn list_hobbies(&self) -> Result<Vec<Hobby>, ClientError> {
        Self::handle(self.http.get(self.url("/api/hobbies")).send().await?).await
    }

    pub async fn recommended_hobbies(&self) -> Result<Vec<Hobby>, ClientError> {
        Self::handle(
            self.http
                .get(self.url("/api/hobbies/recommended"))
                .send()
                .await?,
        )
        .await
    }

    pub async fn nearby_hobbies(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: Option<f64>,
    ) -> Result<Vec<Hobby>, ClientError> {
        let mut request = self
            .http
            .get(self.url("/api/hobbies/nearby"))
            .query(&[("lat", latitude), ("lon", longitude)]);
        if let Some(radius) = radius_m {
            request = request.query(&[("radius", radius)]);
        }
        Self::handle(request.send().await?).await
    }

    pub async fn hobby(&self, id: Uuid) -> Result<Hobby, ClientError> {
        Self::handle(
            self.http
                .get(self.url(&format!("/api/hobbies/{id}")))
                .send()
                .await?,
        )
        .await
    }

    pub async fn hobby_members(
        &self,
        id: Uuid,
    ) -> Result<Vec<hobbyist_shared::types::MemberProfile>, ClientError> {
        Self::handle(
            self.http
                .get(self.url(&format!("/api/hobbies/{id}/members")))
                .send()
                .await?,
        )
        .await
    }

    pub async fn hobby_activities(&self, id: Uuid) -> Result<Vec<ActivityPost>, ClientError> {
        Self::handle(
            self.http
                .get(self.url(&format!("/api/hobbies/{id}/activities")))
                .send()
                .await?,
        )
        .await
    }

    pub async fn create_hobby(
        &self,
        token: &str,
        req: &CreateHobbyRequest,
    ) -> Result<Hobby, ClientError> {
        let response = self
            .http
            .post(self.url("/api/hobbies"))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn join_hobby(&self, token: &str, id: Uuid) -> Result<JoinHobbyResponse, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/api/hobbies/{id}/join")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // ------------------------------------------------------------------
    // Activities
    // ------------------------------------------------------------------

    pub async fn activity_feed(&self, token: &str) -> Result<Vec<ActivityPost>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/activities"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn my_posts(&self, token: &str) -> Result<Vec<ActivityPost>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/activities/me"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn create_activity(
        &self,
        token: &str,
        req: &CreateActivityRequest,
    ) -> Result<ActivityPost, ClientError> {
        let response = self
            .http
            .post(self.url("/api/activities"))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        Self::handle(response).await
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    pub async fn chat_messages(
        &self,
        token: &str,
        hobby_id: Uuid,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/chat/{hobby_id}/messages")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn send_chat_message(
        &self,
        token: &str,
        hobby_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/api/chat/{hobby_id}/messages")))
            .bearer_auth(token)
            .json(&PostMessageRequest {
                content: content.to_string(),
            })
            .send()
            .await?;
        Self::handle(response).await
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub async fn notifications(&self, token: &str) -> Result<Vec<Notification>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/notifications"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn mark_notification_read(
        &self,
        token: &str,
        id: Uuid,
    ) -> Result<MarkReadResponse, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/api/notifications/{id}/read")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    /// Upload image bytes; the response carries the hosted URL to store
    /// in a profile, hobby or post.
    pub async fn upload_image(
        &self,
        token: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        let part = reqwest::multipart::Part::bytes(data).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .http
            .post(self.url("/api/upload/image"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Self::handle(response).await
    }
}

//! Wire types shared by the REST server and the client library.
//!
//! Every payload serializes camelCase so the mobile shell sees the JSON
//! shape it already speaks.  Entity views embed trimmed `MemberProfile`
//! snippets wherever a list would otherwise force a second lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A longitude/latitude pair (longitude first, GeoJSON order).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

/// Trimmed public view of a user, embedded in hobbies, posts and messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: Uuid,
    pub nickname: Option<String>,
    pub profile_picture: Option<String>,
}

/// The caller's own profile, as returned by `GET /api/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub phone_number: String,
    pub nickname: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub joined_hobbies: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hobby {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: String,
    pub member_count: i64,
    pub image_url: Option<String>,
    pub location: Option<GeoPoint>,
    pub creator: MemberProfile,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPost {
    pub id: Uuid,
    pub hobby_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub author: MemberProfile,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub hobby_id: Uuid,
    pub sender: MemberProfile,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    NewMessage,
    ActivityUpdate,
    JoinRequest,
    System,
}

impl NotificationKind {
    /// The wire/storage spelling of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewMessage => "newMessage",
            NotificationKind::ActivityUpdate => "activityUpdate",
            NotificationKind::JoinRequest => "joinRequest",
            NotificationKind::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "newMessage" => Some(NotificationKind::NewMessage),
            "activityUpdate" => Some(NotificationKind::ActivityUpdate),
            "joinRequest" => Some(NotificationKind::JoinRequest),
            "system" => Some(NotificationKind::System),
            _ => None,
        }
    }
}

/// What a notification points at.  A tagged union, so consumers match
/// exhaustively instead of trusting a loose type string next to an id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum RelatedEntity {
    ActivityPost(Uuid),
    Hobby(Uuid),
    User(Uuid),
    Message(Uuid),
}

impl RelatedEntity {
    pub fn kind_str(&self) -> &'static str {
        match self {
            RelatedEntity::ActivityPost(_) => "activityPost",
            RelatedEntity::Hobby(_) => "hobby",
            RelatedEntity::User(_) => "user",
            RelatedEntity::Message(_) => "message",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            RelatedEntity::ActivityPost(id)
            | RelatedEntity::Hobby(id)
            | RelatedEntity::User(id)
            | RelatedEntity::Message(id) => *id,
        }
    }

    /// Rebuild from the two storage columns.
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "activityPost" => Some(RelatedEntity::ActivityPost(id)),
            "hobby" => Some(RelatedEntity::Hobby(id)),
            "user" => Some(RelatedEntity::User(id)),
            "message" => Some(RelatedEntity::Message(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub avatar_url: Option<String>,
    pub read: bool,
    pub related: Option<RelatedEntity>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

/// Missing fields deserialize to empty strings so the handlers can answer
/// with the uniform validation error instead of a body-rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendCodeRequest {
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeResponse {
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyCodeRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserProfile,
}

/// `PATCH /api/users/me` -- absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateHobbyRequest {
    pub name: String,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinHobbyResponse {
    pub message: String,
}

/// `POST /api/activities` -- `hobby_id` in the body; the per-hobby variant
/// takes it from the path instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub hobby_id: Option<Uuid>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub message: String,
    pub notification: Notification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub image_url: String,
}

/// Uniform error body rendered by the server for every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_entity_tagged_encoding() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(RelatedEntity::Hobby(id)).unwrap();
        assert_eq!(json["kind"], "hobby");
        assert_eq!(json["id"], id.to_string());

        let back: RelatedEntity = serde_json::from_value(json).unwrap();
        assert_eq!(back, RelatedEntity::Hobby(id));
    }

    #[test]
    fn test_related_entity_parts_round_trip() {
        let id = Uuid::new_v4();
        for related in [
            RelatedEntity::ActivityPost(id),
            RelatedEntity::Hobby(id),
            RelatedEntity::User(id),
            RelatedEntity::Message(id),
        ] {
            assert_eq!(
                RelatedEntity::from_parts(related.kind_str(), related.id()),
                Some(related)
            );
        }
        assert_eq!(RelatedEntity::from_parts("bogus", id), None);
    }

    #[test]
    fn test_notification_kind_strings() {
        for kind in [
            NotificationKind::NewMessage,
            NotificationKind::ActivityUpdate,
            NotificationKind::JoinRequest,
            NotificationKind::System,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
            // serde spelling matches the storage spelling
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = UserProfile {
            id: Uuid::new_v4(),
            phone_number: "+15551234567".into(),
            nickname: Some("Alex".into()),
            profile_picture: None,
            bio: None,
            interests: vec!["chess".into()],
            joined_hobbies: vec![],
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("phoneNumber").is_some());
        assert!(json.get("joinedHobbies").is_some());
        assert!(json.get("phone_number").is_none());
    }
}

//! CRUD operations for user records.
//!
//! Users are anchored on a unique phone number; a row is created the first
//! time an unseen number passes verification and is never deleted.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use hobbyist_shared::types::{MemberProfile, UpdateProfileRequest, UserProfile};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    // ------------------------------------------------------------------
    // Create / upsert
    // ------------------------------------------------------------------

    /// Look up a user by phone number, creating the row on first sight.
    ///
    /// Idempotent: the unique index on `phone_number` makes a lost race to
    /// insert fall back to the existing row.
    pub fn find_or_create_user(&self, phone_number: &str) -> Result<UserProfile> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO users (id, phone_number, interests, created_at, updated_at)
             VALUES (?1, ?2, '[]', ?3, ?3)",
            params![Uuid::new_v4().to_string(), phone_number, now],
        )?;

        if inserted > 0 {
            tracing::info!(phone = %phone_number, "created user on first login");
        }

        self.get_user_by_phone(phone_number)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a user by id, including the list of joined hobby ids.
    pub fn get_user(&self, id: Uuid) -> Result<UserProfile> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, phone_number, nickname, profile_picture, bio, interests
                 FROM users
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_profile,
            )
            .map_err(map_row_err)?;

        self.with_joined_hobbies(user)
    }

    /// Fetch a user by phone number, including the list of joined hobby ids.
    pub fn get_user_by_phone(&self, phone_number: &str) -> Result<UserProfile> {
        let user = self
            .conn()
            .query_row(
                "SELECT id, phone_number, nickname, profile_picture, bio, interests
                 FROM users
                 WHERE phone_number = ?1",
                params![phone_number],
                row_to_profile,
            )
            .map_err(map_row_err)?;

        self.with_joined_hobbies(user)
    }

    /// List the members of a hobby, oldest join first.
    pub fn list_hobby_members(&self, hobby_id: Uuid) -> Result<Vec<MemberProfile>> {
        let mut stmt = self.conn().prepare(
            "SELECT u.id, u.nickname, u.profile_picture
             FROM hobby_members hm
             JOIN users u ON u.id = hm.user_id
             WHERE hm.hobby_id = ?1
             ORDER BY hm.joined_at ASC",
        )?;

        let rows = stmt.query_map(params![hobby_id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            Ok(MemberProfile {
                id: parse_uuid(0, &id_str)?,
                nickname: row.get(1)?,
                profile_picture: row.get(2)?,
            })
        })?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row?);
        }
        Ok(members)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial profile update; absent fields are left untouched.
    pub fn update_profile(&self, id: Uuid, update: &UpdateProfileRequest) -> Result<UserProfile> {
        let mut user = self.get_user(id)?;

        if let Some(nickname) = &update.nickname {
            user.nickname = Some(nickname.clone());
        }
        if let Some(picture) = &update.profile_picture {
            user.profile_picture = Some(picture.clone());
        }
        if let Some(bio) = &update.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(interests) = &update.interests {
            user.interests = interests.clone();
        }

        let interests_json = serde_json::to_string(&user.interests)?;
        self.conn().execute(
            "UPDATE users
             SET nickname = ?1, profile_picture = ?2, bio = ?3, interests = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                user.nickname,
                user.profile_picture,
                user.bio,
                interests_json,
                Utc::now().to_rfc3339(),
                id.to_string(),
            ],
        )?;

        Ok(user)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn with_joined_hobbies(&self, mut user: UserProfile) -> Result<UserProfile> {
        let mut stmt = self.conn().prepare(
            "SELECT hobby_id FROM hobby_members WHERE user_id = ?1 ORDER BY joined_at ASC",
        )?;

        let rows = stmt.query_map(params![user.id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            parse_uuid(0, &id_str)
        })?;

        user.joined_hobbies.clear();
        for row in rows {
            user.joined_hobbies.push(row?);
        }
        Ok(user)
    }
}

/// Map a `rusqlite::Row` to a [`UserProfile`] (joined hobbies filled later).
fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    let id_str: String = row.get(0)?;
    let interests_json: String = row.get(5)?;

    let interests: Vec<String> = serde_json::from_str(&interests_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(UserProfile {
        id: parse_uuid(0, &id_str)?,
        phone_number: row.get(1)?,
        nickname: row.get(2)?,
        profile_picture: row.get(3)?,
        bio: row.get(4)?,
        interests,
        joined_hobbies: Vec::new(),
    })
}

/// Parse a TEXT column into a [`Uuid`], reporting the column on failure.
pub(crate) fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Translate "no rows" into [`StoreError::NotFound`].
pub(crate) fn map_row_err(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn find_or_create_is_idempotent() {
        let (db, _dir) = test_db();

        let first = db.find_or_create_user("+15551234567").unwrap();
        let second = db.find_or_create_user("+15551234567").unwrap();
        assert_eq!(first.id, second.id);

        let other = db.find_or_create_user("+15557654321").unwrap();
        assert_ne!(first.id, other.id);
    }

    #[test]
    fn update_profile_touches_only_given_fields() {
        let (db, _dir) = test_db();
        let user = db.find_or_create_user("+15551234567").unwrap();

        let updated = db
            .update_profile(
                user.id,
                &UpdateProfileRequest {
                    nickname: Some("Alex".into()),
                    bio: Some("hello".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("Alex"));
        assert_eq!(updated.bio.as_deref(), Some("hello"));

        // a second partial update leaves the earlier fields alone
        let updated = db
            .update_profile(
                user.id,
                &UpdateProfileRequest {
                    interests: Some(vec!["chess".into(), "hiking".into()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("Alex"));
        assert_eq!(updated.interests, vec!["chess", "hiking"]);

        let reread = db.get_user(user.id).unwrap();
        assert_eq!(reread, updated);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.get_user(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }
}

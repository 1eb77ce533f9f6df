//! CRUD operations for activity posts.
//!
//! Posts are immutable once created; there are no edit or delete paths.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use hobbyist_shared::types::{ActivityPost, MemberProfile};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::users::{map_row_err, parse_uuid};

const POST_SELECT: &str = "SELECT p.id, p.hobby_id, p.content, p.image_url, p.created_at,
        u.id, u.nickname, u.profile_picture
 FROM activity_posts p
 JOIN users u ON u.id = p.author_id";

impl Database {
    /// Insert a new post.  Fails with [`StoreError::NotFound`] when the
    /// hobby does not exist.
    pub fn create_activity(
        &self,
        hobby_id: Uuid,
        author_id: Uuid,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<ActivityPost> {
        let hobby_exists: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM hobbies WHERE id = ?1)",
            params![hobby_id.to_string()],
            |row| row.get(0),
        )?;
        if !hobby_exists {
            return Err(StoreError::NotFound);
        }

        let id = Uuid::new_v4();
        self.conn().execute(
            "INSERT INTO activity_posts (id, hobby_id, author_id, content, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                hobby_id.to_string(),
                author_id.to_string(),
                content,
                image_url,
                Utc::now().to_rfc3339(),
            ],
        )?;

        self.get_activity(id)
    }

    /// Fetch a single post with its author snippet.
    pub fn get_activity(&self, id: Uuid) -> Result<ActivityPost> {
        self.conn()
            .query_row(
                &format!("{POST_SELECT} WHERE p.id = ?1"),
                params![id.to_string()],
                row_to_post,
            )
            .map_err(map_row_err)
    }

    /// The global feed: every post, newest first.
    pub fn list_activity_feed(&self) -> Result<Vec<ActivityPost>> {
        self.query_posts(&format!("{POST_SELECT} ORDER BY p.created_at DESC"), [])
    }

    /// Posts in one hobby, newest first, capped at `limit`.
    pub fn list_activities_for_hobby(&self, hobby_id: Uuid, limit: u32) -> Result<Vec<ActivityPost>> {
        let mut stmt = self.conn().prepare(&format!(
            "{POST_SELECT} WHERE p.hobby_id = ?1 ORDER BY p.created_at DESC LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![hobby_id.to_string(), limit], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    /// Posts authored by one user, newest first.
    pub fn list_activities_by_author(&self, author_id: Uuid) -> Result<Vec<ActivityPost>> {
        let mut stmt = self.conn().prepare(&format!(
            "{POST_SELECT} WHERE p.author_id = ?1 ORDER BY p.created_at DESC"
        ))?;

        let rows = stmt.query_map(params![author_id.to_string()], row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn query_posts<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ActivityPost>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, row_to_post)?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }
}

/// Map a joined `activity_posts x users` row to an [`ActivityPost`].
fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActivityPost> {
    let id_str: String = row.get(0)?;
    let hobby_id_str: String = row.get(1)?;
    let created_str: String = row.get(4)?;
    let author_id_str: String = row.get(5)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ActivityPost {
        id: parse_uuid(0, &id_str)?,
        hobby_id: parse_uuid(1, &hobby_id_str)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        author: MemberProfile {
            id: parse_uuid(5, &author_id_str)?,
            nickname: row.get(6)?,
            profile_picture: row.get(7)?,
        },
        created_at,
    })
}

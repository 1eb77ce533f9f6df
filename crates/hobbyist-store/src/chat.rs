//! Append-only chat messages, one stream per hobby.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use hobbyist_shared::types::{ChatMessage, MemberProfile};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::users::{map_row_err, parse_uuid};

const MESSAGE_SELECT: &str = "SELECT m.id, m.hobby_id, m.content, m.created_at,
        u.id, u.nickname, u.profile_picture
 FROM chat_messages m
 JOIN users u ON u.id = m.sender_id";

impl Database {
    /// Append a message to a hobby's chat.  Fails with
    /// [`StoreError::NotFound`] when the hobby does not exist.
    pub fn insert_chat_message(
        &self,
        hobby_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage> {
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
            "INSERT INTO chat_messages (id, hobby_id, sender_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                hobby_id.to_string(),
                sender_id.to_string(),
                content,
                Utc::now().to_rfc3339(),
            ],
        )?;

        self.conn()
            .query_row(
                &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
                params![id.to_string()],
                row_to_message,
            )
            .map_err(map_row_err)
    }

    /// All messages in a hobby's chat, oldest first (the order clients
    /// render them in).
    pub fn list_chat_messages(&self, hobby_id: Uuid) -> Result<Vec<ChatMessage>> {
        let mut stmt = self.conn().prepare(&format!(
            "{MESSAGE_SELECT} WHERE m.hobby_id = ?1 ORDER BY m.created_at ASC"
        ))?;

        let rows = stmt.query_map(params![hobby_id.to_string()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }
}

/// Map a joined `chat_messages x users` row to a [`ChatMessage`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let id_str: String = row.get(0)?;
    let hobby_id_str: String = row.get(1)?;
    let created_str: String = row.get(3)?;
    let sender_id_str: String = row.get(4)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ChatMessage {
        id: parse_uuid(0, &id_str)?,
        hobby_id: parse_uuid(1, &hobby_id_str)?,
        content: row.get(2)?,
        sender: MemberProfile {
            id: parse_uuid(4, &sender_id_str)?,
            nickname: row.get(5)?,
            profile_picture: row.get(6)?,
        },
        created_at,
    })
}

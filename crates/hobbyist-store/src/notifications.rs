//! Notification inbox records.
//!
//! Rows are written by server-side business logic (and the demo seeder);
//! the only mutation is the read-state toggle.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use hobbyist_shared::types::{Notification, NotificationKind, RelatedEntity};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::users::{map_row_err, parse_uuid};

/// Everything needed to create a notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub avatar_url: Option<String>,
    pub related: Option<RelatedEntity>,
}

impl Database {
    /// Insert a notification for a recipient.
    pub fn insert_notification(&self, new: &NewNotification) -> Result<Notification> {
        let id = Uuid::new_v4();
        self.conn().execute(
            "INSERT INTO notifications
                 (id, user_id, kind, message, avatar_url, read, related_kind, related_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8)",
            params![
                id.to_string(),
                new.user_id.to_string(),
                new.kind.as_str(),
                new.message,
                new.avatar_url,
                new.related.map(|r| r.kind_str()),
                new.related.map(|r| r.id().to_string()),
                Utc::now().to_rfc3339(),
            ],
        )?;

        self.get_notification(id)
    }

    /// Fetch a single notification.
    pub fn get_notification(&self, id: Uuid) -> Result<Notification> {
        self.conn()
            .query_row(
                "SELECT id, user_id, kind, message, avatar_url, read, related_kind, related_id, created_at
                 FROM notifications
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_notification,
            )
            .map_err(map_row_err)
    }

    /// A recipient's inbox, newest first.
    pub fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, kind, message, avatar_url, read, related_kind, related_id, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], row_to_notification)?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    /// Flip the read flag -- but only when the notification belongs to
    /// `user_id`.  Anything else is indistinguishable from "not found".
    pub fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> Result<Notification> {
        let affected = self.conn().execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.get_notification(id)
    }
}

/// Map a `rusqlite::Row` to a [`Notification`].
fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let kind_str: String = row.get(2)?;
    let read_int: i64 = row.get(5)?;
    let related_kind: Option<String> = row.get(6)?;
    let related_id: Option<String> = row.get(7)?;
    let created_str: String = row.get(8)?;

    let kind = NotificationKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown notification kind: {kind_str}").into(),
        )
    })?;

    let related = match (related_kind, related_id) {
        (Some(kind), Some(id)) => RelatedEntity::from_parts(&kind, parse_uuid(7, &id)?),
        _ => None,
    };

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Notification {
        id: parse_uuid(0, &id_str)?,
        user_id: parse_uuid(1, &user_id_str)?,
        kind,
        message: row.get(3)?,
        avatar_url: row.get(4)?,
        read: read_int != 0,
        related,
        created_at,
    })
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
    fn insert_and_mark_read() {
        let (db, _dir) = test_db();
        let user = db.find_or_create_user("+15551234567").unwrap();
        let hobby_id = Uuid::new_v4();

        let created = db
            .insert_notification(&NewNotification {
                user_id: user.id,
                kind: NotificationKind::JoinRequest,
                message: "Someone joined your club".into(),
                avatar_url: None,
                related: Some(RelatedEntity::Hobby(hobby_id)),
            })
            .unwrap();
        assert!(!created.read);
        assert_eq!(created.related, Some(RelatedEntity::Hobby(hobby_id)));
        assert_eq!(created.kind, NotificationKind::JoinRequest);

        let marked = db.mark_notification_read(created.id, user.id).unwrap();
        assert!(marked.read);
    }

    #[test]
    fn mark_read_checks_ownership() {
        let (db, _dir) = test_db();
        let owner = db.find_or_create_user("+15551234567").unwrap();
        let other = db.find_or_create_user("+15557654321").unwrap();

        let created = db
            .insert_notification(&NewNotification {
                user_id: owner.id,
                kind: NotificationKind::System,
                message: "Welcome!".into(),
                avatar_url: None,
                related: None,
            })
            .unwrap();

        assert!(matches!(
            db.mark_notification_read(created.id, other.id),
            Err(StoreError::NotFound)
        ));
        assert!(!db.get_notification(created.id).unwrap().read);
    }

    #[test]
    fn inbox_lists_only_own_newest_first() {
        let (db, _dir) = test_db();
        let user = db.find_or_create_user("+15551234567").unwrap();
        let other = db.find_or_create_user("+15557654321").unwrap();

        for i in 0..3 {
            db.insert_notification(&NewNotification {
                user_id: user.id,
                kind: NotificationKind::System,
                message: format!("note {i}"),
                avatar_url: None,
                related: None,
            })
            .unwrap();
        }
        db.insert_notification(&NewNotification {
            user_id: other.id,
            kind: NotificationKind::System,
            message: "not yours".into(),
            avatar_url: None,
            related: None,
        })
        .unwrap();

        let inbox = db.list_notifications(user.id).unwrap();
        assert_eq!(inbox.len(), 3);
        assert_eq!(inbox[0].message, "note 2");
        assert!(inbox.iter().all(|n| n.user_id == user.id));
    }
}

//! CRUD and membership operations for hobby records.
//!
//! The `hobby_members` relation is the source of truth for who belongs
//! where; `member_count` is a projection maintained inside the same
//! transaction as the relation write, so the two cannot drift.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use hobbyist_shared::geo::haversine_distance_m;
use hobbyist_shared::types::{CreateHobbyRequest, GeoPoint, Hobby, MemberProfile};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::users::{map_row_err, parse_uuid};

const HOBBY_SELECT: &str = "SELECT h.id, h.name, h.category, h.description, h.member_count,
        h.image_url, h.longitude, h.latitude, h.created_at,
        u.id, u.nickname, u.profile_picture
 FROM hobbies h
 JOIN users u ON u.id = h.creator_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new hobby with the creator as its first member.
    ///
    /// Hobby row and membership row are written in one transaction, so the
    /// count starts at 1 with exactly one matching relation row.
    pub fn create_hobby(&mut self, creator_id: Uuid, req: &CreateHobbyRequest) -> Result<Hobby> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO hobbies
                 (id, name, category, description, member_count, image_url,
                  longitude, latitude, creator_id, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, ?8, ?9)",
            params![
                id.to_string(),
                req.name,
                req.category,
                req.description,
                req.image_url,
                req.location.map(|p| p.longitude),
                req.location.map(|p| p.latitude),
                creator_id.to_string(),
                now,
            ],
        )?;
        tx.execute(
            "INSERT INTO hobby_members (hobby_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![id.to_string(), creator_id.to_string(), now],
        )?;
        tx.commit()?;

        tracing::info!(hobby = %id, creator = %creator_id, "hobby created");
        self.get_hobby(id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single hobby with its creator snippet.
    pub fn get_hobby(&self, id: Uuid) -> Result<Hobby> {
        self.conn()
            .query_row(
                &format!("{HOBBY_SELECT} WHERE h.id = ?1"),
                params![id.to_string()],
                row_to_hobby,
            )
            .map_err(map_row_err)
    }

    /// List all hobbies, newest first.
    pub fn list_hobbies(&self) -> Result<Vec<Hobby>> {
        self.query_hobbies(&format!("{HOBBY_SELECT} ORDER BY h.created_at DESC"), [])
    }

    /// List up to `limit` hobbies (recommendation sample / nearby fallback).
    pub fn list_limited(&self, limit: u32) -> Result<Vec<Hobby>> {
        self.query_hobbies(&format!("{HOBBY_SELECT} LIMIT ?1"), [limit])
    }

    /// Hobbies with a location within `radius_m` metres of `origin`,
    /// closest first.  Linear haversine scan; fine at this scale.
    pub fn list_nearby(&self, origin: GeoPoint, radius_m: f64) -> Result<Vec<Hobby>> {
        let located = self.query_hobbies(
            &format!("{HOBBY_SELECT} WHERE h.longitude IS NOT NULL AND h.latitude IS NOT NULL"),
            [],
        )?;

        let mut nearby: Vec<(f64, Hobby)> = located
            .into_iter()
            .filter_map(|hobby| {
                let point = hobby.location?;
                let distance = haversine_distance_m(origin, point);
                (distance <= radius_m).then_some((distance, hobby))
            })
            .collect();
        nearby.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(nearby.into_iter().map(|(_, hobby)| hobby).collect())
    }

    /// List the hobbies a user has joined, oldest join first.
    pub fn list_joined_hobbies(&self, user_id: Uuid) -> Result<Vec<Hobby>> {
        let mut stmt = self.conn().prepare(&format!(
            "{HOBBY_SELECT}
             JOIN hobby_members hm ON hm.hobby_id = h.id
             WHERE hm.user_id = ?1
             ORDER BY hm.joined_at ASC"
        ))?;

        let rows = stmt.query_map(params![user_id.to_string()], row_to_hobby)?;

        let mut hobbies = Vec::new();
        for row in rows {
            hobbies.push(row?);
        }
        Ok(hobbies)
    }

    // ------------------------------------------------------------------
    // Join
    // ------------------------------------------------------------------

    /// Add `user_id` to `hobby_id`.
    ///
    /// Membership check, relation insert and count increment run in one
    /// transaction; together with the relation's primary key that makes a
    /// duplicate join fail with [`StoreError::AlreadyMember`] without ever
    /// double-inserting or double-incrementing, even for racing attempts.
    pub fn join_hobby(&mut self, hobby_id: Uuid, user_id: Uuid) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let user_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        let hobby_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM hobbies WHERE id = ?1)",
            params![hobby_id.to_string()],
            |row| row.get(0),
        )?;
        if !user_exists || !hobby_exists {
            return Err(StoreError::NotFound);
        }

        let already: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM hobby_members WHERE hobby_id = ?1 AND user_id = ?2)",
            params![hobby_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        if already {
            return Err(StoreError::AlreadyMember);
        }

        tx.execute(
            "INSERT INTO hobby_members (hobby_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![
                hobby_id.to_string(),
                user_id.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.execute(
            "UPDATE hobbies SET member_count = member_count + 1 WHERE id = ?1",
            params![hobby_id.to_string()],
        )?;

        tx.commit()?;
        tracing::info!(hobby = %hobby_id, user = %user_id, "user joined hobby");
        Ok(())
    }

    /// Recompute every `member_count` from the membership relation.
    ///
    /// Maintenance entry point for databases imported from systems that let
    /// the counter drift.  Returns the number of repaired rows.
    pub fn reconcile_member_counts(&mut self) -> Result<usize> {
        let repaired = self.conn().execute(
            "UPDATE hobbies
             SET member_count =
                 (SELECT COUNT(*) FROM hobby_members WHERE hobby_id = hobbies.id)
             WHERE member_count !=
                 (SELECT COUNT(*) FROM hobby_members WHERE hobby_id = hobbies.id)",
            [],
        )?;

        if repaired > 0 {
            tracing::warn!(repaired, "repaired drifted member counts");
        }
        Ok(repaired)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn query_hobbies<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Hobby>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, row_to_hobby)?;

        let mut hobbies = Vec::new();
        for row in rows {
            hobbies.push(row?);
        }
        Ok(hobbies)
    }
}

/// Map a joined `hobbies x users` row to a [`Hobby`].
fn row_to_hobby(row: &rusqlite::Row<'_>) -> rusqlite::Result<Hobby> {
    let id_str: String = row.get(0)?;
    let longitude: Option<f64> = row.get(6)?;
    let latitude: Option<f64> = row.get(7)?;
    let created_str: String = row.get(8)?;
    let creator_id_str: String = row.get(9)?;

    let location = match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Some(GeoPoint {
            longitude,
            latitude,
        }),
        _ => None,
    };

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Hobby {
        id: parse_uuid(0, &id_str)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        member_count: row.get(4)?,
        image_url: row.get(5)?,
        location,
        creator: MemberProfile {
            id: parse_uuid(9, &creator_id_str)?,
            nickname: row.get(10)?,
            profile_picture: row.get(11)?,
        },
        created_at,
    })
}

//! Opt-in demo dataset.
//!
//! With `SEED_DEMO_DATA=true` and an empty database, inserts a demo user,
//! a handful of located hobbies, some posts, chat messages and
//! notifications so a fresh install has something to browse.

use hobbyist_shared::types::{
    CreateHobbyRequest, GeoPoint, NotificationKind, RelatedEntity, UpdateProfileRequest,
};
use hobbyist_store::notifications::NewNotification;
use hobbyist_store::{Database, StoreError};

pub fn seed_demo_data(db: &mut Database) -> Result<(), StoreError> {
    let users: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    if users > 0 {
        tracing::debug!("database not empty, skipping demo seed");
        return Ok(());
    }

    let tester = db.find_or_create_user("+12138004466")?;
    db.update_profile(
        tester.id,
        &UpdateProfileRequest {
            nickname: Some("Hobby Tester".into()),
            profile_picture: Some("https://picsum.photos/id/1062/150/150".into()),
            bio: Some("Loves trying every hobby at least once.".into()),
            interests: Some(vec!["Photography".into(), "Cooking".into(), "Hiking".into()]),
        },
    )?;

    let clubs: [(&str, &str, &str, u32, Option<GeoPoint>); 5] = [
        (
            "Photography Circle",
            "Photography",
            "Shoot and share landscapes, portraits and street snaps together.",
            1001,
            Some(GeoPoint {
                longitude: -118.2437,
                latitude: 34.0522,
            }),
        ),
        (
            "Hiking Meetup",
            "Outdoor",
            "Weekly hikes on the trails around the city.",
            1002,
            Some(GeoPoint {
                longitude: -118.3417,
                latitude: 34.1184,
            }),
        ),
        (
            "Painting Class",
            "Art",
            "Oil and watercolor classes that beginners can pick up easily.",
            1003,
            Some(GeoPoint {
                longitude: 127.0580,
                latitude: 37.5000,
            }),
        ),
        (
            "Cooking Workshop",
            "Cooking",
            "A new recipe to cook and taste together every week.",
            1004,
            Some(GeoPoint {
                longitude: -118.3256,
                latitude: 34.0928,
            }),
        ),
        (
            "Yoga Sessions",
            "Fitness",
            "Train body and mind. Beginners welcome!",
            1005,
            Some(GeoPoint {
                longitude: -118.4912,
                latitude: 34.0195,
            }),
        ),
    ];

    let mut created = Vec::new();
    for (name, category, description, image_id, location) in clubs {
        let hobby = db.create_hobby(
            tester.id,
            &CreateHobbyRequest {
                name: name.into(),
                category: category.into(),
                description: description.into(),
                image_url: Some(format!("https://picsum.photos/id/{image_id}/300/200")),
                location,
            },
        )?;
        created.push(hobby.id);
    }

    let hobby_id = created[0];
    let post = db.create_activity(
        hobby_id,
        tester.id,
        "Golden hour shoot at the river this Saturday. Who's in?",
        Some("https://picsum.photos/id/1011/400/300"),
    )?;
    db.create_activity(hobby_id, tester.id, "Sharing last week's best shots.", None)?;

    db.insert_chat_message(hobby_id, tester.id, "Welcome to the circle!")?;
    db.insert_chat_message(hobby_id, tester.id, "Post your questions here anytime.")?;

    db.insert_notification(&NewNotification {
        user_id: tester.id,
        kind: NotificationKind::System,
        message: "Welcome to Hobbyist!".into(),
        avatar_url: None,
        related: None,
    })?;
    db.insert_notification(&NewNotification {
        user_id: tester.id,
        kind: NotificationKind::ActivityUpdate,
        message: "New activity in Photography Circle.".into(),
        avatar_url: Some("https://picsum.photos/id/1062/150/150".into()),
        related: Some(RelatedEntity::ActivityPost(post.id)),
    })?;

    tracing::info!("seeded demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_once_into_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();

        seed_demo_data(&mut db).unwrap();
        let hobbies = db.list_hobbies().unwrap();
        assert_eq!(hobbies.len(), 5);

        let tester = db.get_user_by_phone("+12138004466").unwrap();
        assert_eq!(tester.joined_hobbies.len(), 5);
        assert!(!db.list_notifications(tester.id).unwrap().is_empty());

        // second run is a no-op
        seed_demo_data(&mut db).unwrap();
        assert_eq!(db.list_hobbies().unwrap().len(), 5);
    }
}

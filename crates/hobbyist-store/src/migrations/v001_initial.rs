//! v001 -- Initial schema creation.
//!
//! Creates the six core tables: `users`, `hobbies`, `hobby_members`,
//! `activity_posts`, `chat_messages`, and `notifications`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    phone_number    TEXT NOT NULL UNIQUE,        -- E.164-like
    nickname        TEXT,
    profile_picture TEXT,
    bio             TEXT,
    interests       TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    created_at      TEXT NOT NULL,               -- ISO-8601 / RFC-3339
    updated_at      TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Hobbies
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS hobbies (
    id           TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    name         TEXT NOT NULL,
    category     TEXT NOT NULL,
    description  TEXT NOT NULL,
    member_count INTEGER NOT NULL DEFAULT 1,     -- projection of hobby_members
    image_url    TEXT,
    longitude    REAL,                           -- nullable pair
    latitude     REAL,
    creator_id   TEXT NOT NULL,
    created_at   TEXT NOT NULL,

    FOREIGN KEY (creator_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_hobbies_created ON hobbies(created_at DESC);

-- ----------------------------------------------------------------
-- Membership relation (source of truth; member_count is derived)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS hobby_members (
    hobby_id  TEXT NOT NULL,
    user_id   TEXT NOT NULL,
    joined_at TEXT NOT NULL,

    PRIMARY KEY (hobby_id, user_id),
    FOREIGN KEY (hobby_id) REFERENCES hobbies(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id)  REFERENCES users(id)   ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_hobby_members_user ON hobby_members(user_id);

-- ----------------------------------------------------------------
-- Activity posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS activity_posts (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    hobby_id   TEXT NOT NULL,
    author_id  TEXT NOT NULL,
    content    TEXT NOT NULL DEFAULT '',         -- may be empty when image_url set
    image_url  TEXT,
    created_at TEXT NOT NULL,

    FOREIGN KEY (hobby_id)  REFERENCES hobbies(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_activity_posts_hobby_created
    ON activity_posts(hobby_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_activity_posts_author_created
    ON activity_posts(author_id, created_at DESC);

-- ----------------------------------------------------------------
-- Chat messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chat_messages (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    hobby_id   TEXT NOT NULL,
    sender_id  TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (hobby_id)  REFERENCES hobbies(id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_chat_messages_hobby_ts
    ON chat_messages(hobby_id, created_at ASC);

-- ----------------------------------------------------------------
-- Notifications
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id           TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    user_id      TEXT NOT NULL,
    kind         TEXT NOT NULL,                  -- newMessage | activityUpdate | joinRequest | system
    message      TEXT NOT NULL,
    avatar_url   TEXT,
    read         INTEGER NOT NULL DEFAULT 0,     -- boolean 0/1
    related_kind TEXT,                           -- tagged union, kind half
    related_id   TEXT,                           -- tagged union, id half
    created_at   TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_notifications_user_created
    ON notifications(user_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

//! # hobbyist-store
//!
//! Embedded persistence for the Hobbyist server, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model.  Multi-row invariants (hobby creation, joining) run inside SQLite
//! transactions: the `hobby_members` relation is the source of truth for
//! membership and the `member_count` column is a projection maintained in
//! the same transaction.

pub mod activities;
pub mod chat;
pub mod database;
pub mod hobbies;
pub mod migrations;
pub mod notifications;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;

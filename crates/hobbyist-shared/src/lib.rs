//! # hobbyist-shared
//!
//! Types shared between the Hobbyist REST server and the client library:
//! the wire payloads (serialized camelCase for the mobile shell), the signed
//! session-token format, and the haversine helper used by the nearby query.

pub mod geo;
pub mod token;
pub mod types;

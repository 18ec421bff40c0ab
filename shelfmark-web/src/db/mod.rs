//! Record access layer
//!
//! One module per entity. Every statement passes the owner id explicitly,
//! even though ownership is also implied by the caller's session; reads and
//! writes never cross user boundaries.

pub mod books;
pub mod favorite_authors;
pub mod loans;
pub mod quotes;
pub mod sessions;
pub mod tags;
pub mod users;

use chrono::{DateTime, Utc};
use shelfmark_common::{Error, Result};
use uuid::Uuid;

/// Decode a UUID stored as TEXT
pub(crate) fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))
}

/// Decode an RFC 3339 timestamp stored as TEXT
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))
}

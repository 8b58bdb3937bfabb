//! Rows of the in-memory backend tables.

pub mod comment;
pub mod milestone;
pub mod project;
pub mod task;
pub mod user;

use time::{OffsetDateTime, PrimitiveDateTime};

/// Current UTC time without offset, the form every row stores
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

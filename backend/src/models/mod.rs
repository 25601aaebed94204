use std::sync::Arc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::services::member_locks::MemberLocks;

pub mod family_member;
pub mod activity_log;
pub mod challenge;

pub use family_member::*;
pub use activity_log::*;
pub use challenge::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub member_locks: Arc<MemberLocks>,
}

/// Parse a UUID stored as TEXT, logging rows that were written outside this service
pub(crate) fn parse_stored_uuid(value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap_or_else(|e| {
        log::warn!("Invalid UUID '{}' in database: {}", value, e);
        Uuid::nil()
    })
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::ActivityType;
use sqlx::FromRow;

use super::parse_stored_uuid;

/// Database model for activity logs
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivityLogRow {
    pub id: String,
    pub user_id: String,
    pub family_member_id: String,
    pub activity_type: String,
    pub kilometers: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogRow {
    pub fn to_shared(&self) -> shared::ActivityLog {
        shared::ActivityLog {
            id: parse_stored_uuid(&self.id),
            user_id: parse_stored_uuid(&self.user_id),
            family_member_id: parse_stored_uuid(&self.family_member_id),
            activity_type: self.activity_type.parse().unwrap_or(ActivityType::Walking),
            kilometers: self.kilometers,
            date: self.date,
            notes: self.notes.clone(),
            created_at: self.created_at,
        }
    }
}

/// Activity log joined with the name and avatar of its member
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogWithMemberRow {
    pub id: String,
    pub user_id: String,
    pub family_member_id: String,
    pub activity_type: String,
    pub kilometers: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub member_name: String,
    pub member_avatar: String,
}

impl ActivityLogWithMemberRow {
    pub fn into_shared(self) -> shared::ActivityLogWithMember {
        let log = ActivityLogRow {
            id: self.id,
            user_id: self.user_id,
            family_member_id: self.family_member_id,
            activity_type: self.activity_type,
            kilometers: self.kilometers,
            date: self.date,
            notes: self.notes,
            created_at: self.created_at,
        }
        .to_shared();

        shared::ActivityLogWithMember {
            log,
            member_name: self.member_name,
            member_avatar: self.member_avatar,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::Gender;
use sqlx::FromRow;

use super::parse_stored_uuid;

/// Database model for family members
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FamilyMemberRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub gender: String,
    pub age: i32,
    pub avatar: String,
    pub streak: i64,
    pub last_activity: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FamilyMemberRow {
    pub fn to_shared(&self) -> shared::FamilyMember {
        shared::FamilyMember {
            id: parse_stored_uuid(&self.id),
            user_id: parse_stored_uuid(&self.user_id),
            name: self.name.clone(),
            gender: self.gender.parse().unwrap_or(Gender::Other),
            age: self.age,
            avatar: self.avatar.clone(),
            streak: u32::try_from(self.streak).unwrap_or(0),
            last_activity: self.last_activity.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

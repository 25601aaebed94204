use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::parse_stored_uuid;

/// Database model for challenges
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChallengeRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub activity_type: Option<String>,
    pub goal_km: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl ChallengeRow {
    pub fn to_shared(&self) -> shared::Challenge {
        shared::Challenge {
            id: parse_stored_uuid(&self.id),
            user_id: parse_stored_uuid(&self.user_id),
            title: self.title.clone(),
            description: self.description.clone(),
            activity_type: self.activity_type.as_ref().and_then(|t| t.parse().ok()),
            goal_km: self.goal_km,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ActivityType;
    use uuid::Uuid;

    #[test]
    fn test_challenge_row_to_shared() {
        let id = Uuid::new_v4();
        let row = ChallengeRow {
            id: id.to_string(),
            user_id: Uuid::new_v4().to_string(),
            title: "January Running Challenge".to_string(),
            description: "Run 100km this month".to_string(),
            activity_type: Some("running".to_string()),
            goal_km: 100.0,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            created_at: Utc::now(),
        };

        let shared = row.to_shared();

        assert_eq!(shared.id, id);
        assert_eq!(shared.activity_type, Some(ActivityType::Running));
        assert_eq!(shared.goal_km, 100.0);
    }

    #[test]
    fn test_challenge_row_without_activity_type() {
        let row = ChallengeRow {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            title: "Family distance".to_string(),
            description: String::new(),
            activity_type: None,
            goal_km: 250.0,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
            created_at: Utc::now(),
        };

        assert!(row.to_shared().activity_type.is_none());
    }
}

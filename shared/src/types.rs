use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Label stored on a member that has never logged an activity
pub const LAST_ACTIVITY_NEVER: &str = "Never";
pub const LAST_ACTIVITY_TODAY: &str = "Today";
pub const LAST_ACTIVITY_YESTERDAY: &str = "Yesterday";

// ============================================================================
// Family Member Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub age: i32,
    pub avatar: String,
    /// Cached current streak, re-derived from the activity history
    pub streak: u32,
    /// Cached label of the most recent activity ("Never", "Today", "Yesterday", "Mar 5")
    pub last_activity: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFamilyMemberRequest {
    pub name: String,
    pub gender: Gender,
    pub age: i32,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFamilyMemberRequest {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub avatar: Option<String>,
}

// ============================================================================
// Streak Types
// ============================================================================

/// Derived streak values for one member, computed from their full activity history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakResult {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_label: String,
}

impl StreakResult {
    /// Result for a member without any logged activity
    pub fn never() -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            last_activity_label: LAST_ACTIVITY_NEVER.to_string(),
        }
    }
}

// ============================================================================
// Activity Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Walking,
    Running,
    Cycling,
    Swimming,
    Hiking,
    /// Counted trips rather than kilometers
    HyreHoj,
}

impl ActivityType {
    pub const ALL: [ActivityType; 6] = [
        ActivityType::Walking,
        ActivityType::Running,
        ActivityType::Cycling,
        ActivityType::Swimming,
        ActivityType::Hiking,
        ActivityType::HyreHoj,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Walking => "walking",
            ActivityType::Running => "running",
            ActivityType::Cycling => "cycling",
            ActivityType::Swimming => "swimming",
            ActivityType::Hiking => "hiking",
            ActivityType::HyreHoj => "hyre_hoj",
        }
    }

    /// Whether `kilometers` is a distance; trip-counted types only show up in their own totals
    pub fn is_distance(&self) -> bool {
        !matches!(self, ActivityType::HyreHoj)
    }
}

impl FromStr for ActivityType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walking" => Ok(ActivityType::Walking),
            "running" => Ok(ActivityType::Running),
            "cycling" => Ok(ActivityType::Cycling),
            "swimming" => Ok(ActivityType::Swimming),
            "hiking" => Ok(ActivityType::Hiking),
            "hyre_hoj" => Ok(ActivityType::HyreHoj),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_member_id: Uuid,
    pub activity_type: ActivityType,
    pub kilometers: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogWithMember {
    pub log: ActivityLog,
    pub member_name: String,
    pub member_avatar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityRequest {
    pub family_member_id: Uuid,
    pub activity_type: ActivityType,
    pub kilometers: f64,
    /// Defaults to the current day when omitted
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateActivityRequest {
    pub family_member_id: Option<Uuid>,
    pub activity_type: Option<ActivityType>,
    pub kilometers: Option<f64>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Response after logging or editing an activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogged {
    pub activity: ActivityLog,
    pub streak: StreakResult,
}

// ============================================================================
// Challenge Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeDuration {
    OneWeek,
    TwoWeeks,
    OneMonth,
    ThreeMonths,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    /// None means every activity type counts towards the goal
    pub activity_type: Option<ActivityType>,
    pub goal_km: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChallengeRequest {
    pub title: String,
    pub description: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub goal_km: f64,
    pub duration: ChallengeDuration,
    pub start_date: Option<NaiveDate>,
    /// Required for custom durations, ignored otherwise
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub challenge: Challenge,
    pub total_km: f64,
    pub progress_percent: i64,
    pub days_left: i64,
    pub member_count: i64,
    pub active_today: i64,
    pub best_streak: u32,
    pub is_active: bool,
}

// ============================================================================
// Leaderboard Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceLeaderboardEntry {
    pub rank: u32,
    pub member_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub total_km: f64,
    pub walking_km: f64,
    pub running_km: f64,
    pub cycling_km: f64,
    pub streak: u32,
    pub last_activity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakLeaderboardEntry {
    pub rank: u32,
    pub member_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub longest_streak: u32,
    pub current_streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    Today,
    #[default]
    AllTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLeaderboardEntry {
    pub rank: u32,
    pub member_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub total: f64,
}

// ============================================================================
// Statistics Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityTypeTotal {
    pub activity_type: ActivityType,
    pub kilometers: f64,
    /// Rounded share of the total distance (0-100)
    pub percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberBreakdown {
    pub member_id: Uuid,
    pub name: String,
    pub total_km: f64,
    pub by_type: Vec<ActivityTypeTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityBreakdown {
    pub total_km: f64,
    pub by_type: Vec<ActivityTypeTotal>,
    pub members: Vec<MemberBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub activities: Vec<ActivityLogWithMember>,
    pub total_km: f64,
    /// Every date with at least one logged activity, ascending
    pub active_dates: Vec<NaiveDate>,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_from_str() {
        assert_eq!("walking".parse(), Ok(ActivityType::Walking));
        assert_eq!("RUNNING".parse(), Ok(ActivityType::Running));
        assert_eq!("Cycling".parse(), Ok(ActivityType::Cycling));
        assert_eq!("hyre_hoj".parse(), Ok(ActivityType::HyreHoj));
        assert!("skating".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_activity_type_as_str_matches_serde() {
        for activity_type in ActivityType::ALL {
            let json = serde_json::to_string(&activity_type).unwrap();
            assert_eq!(json, format!("\"{}\"", activity_type.as_str()));
        }
    }

    #[test]
    fn test_activity_type_is_distance() {
        assert!(ActivityType::Walking.is_distance());
        assert!(ActivityType::Hiking.is_distance());
        assert!(!ActivityType::HyreHoj.is_distance());
    }

    #[test]
    fn test_gender_from_str() {
        assert_eq!("male".parse(), Ok(Gender::Male));
        assert_eq!("Female".parse(), Ok(Gender::Female));
        assert_eq!("OTHER".parse(), Ok(Gender::Other));
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn test_streak_result_never() {
        let result = StreakResult::never();
        assert_eq!(result.current_streak, 0);
        assert_eq!(result.longest_streak, 0);
        assert_eq!(result.last_activity_label, "Never");
    }

    #[test]
    fn test_leaderboard_scope_deserialize() {
        let scope: LeaderboardScope = serde_json::from_str("\"today\"").unwrap();
        assert_eq!(scope, LeaderboardScope::Today);
        let scope: LeaderboardScope = serde_json::from_str("\"all_time\"").unwrap();
        assert_eq!(scope, LeaderboardScope::AllTime);
        assert_eq!(LeaderboardScope::default(), LeaderboardScope::AllTime);
    }

    #[test]
    fn test_api_success() {
        let success = ApiSuccess::new("test data");
        assert_eq!(success.data, "test data");
    }
}

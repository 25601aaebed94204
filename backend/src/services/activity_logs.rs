use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ActivityLogRow, ActivityLogWithMemberRow};
use crate::services::member_locks::MemberLocks;
use crate::services::streaks::{self, StreakError};
use shared::{
    ActivityLog, ActivityLogWithMember, ActivityLogged, CreateActivityRequest,
    UpdateActivityRequest,
};

#[derive(Debug, Error)]
pub enum ActivityLogError {
    #[error("Activity log not found")]
    NotFound,
    #[error("Family member not found")]
    MemberNotFound,
    #[error("Invalid activity: {0}")]
    Validation(String),
    #[error("Streak recalculation failed: {0}")]
    Streak(#[from] StreakError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Optional filters for listing activities
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub date: Option<NaiveDate>,
    pub family_member_id: Option<Uuid>,
}

fn validate_kilometers(kilometers: f64) -> Result<f64, ActivityLogError> {
    if !kilometers.is_finite() || kilometers < 0.0 {
        return Err(ActivityLogError::Validation(
            "Kilometers must be a non-negative number".to_string(),
        ));
    }
    Ok(kilometers)
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

async fn member_belongs_to(
    pool: &SqlitePool,
    user_id: &Uuid,
    member_id: &Uuid,
) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM family_members WHERE id = ? AND user_id = ?",
    )
    .bind(member_id.to_string())
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Log an activity and refresh the member's cached streak
pub async fn log_activity(
    pool: &SqlitePool,
    locks: &MemberLocks,
    user_id: &Uuid,
    request: &CreateActivityRequest,
    today: NaiveDate,
) -> Result<ActivityLogged, ActivityLogError> {
    let kilometers = validate_kilometers(request.kilometers)?;

    if !member_belongs_to(pool, user_id, &request.family_member_id).await? {
        return Err(ActivityLogError::MemberNotFound);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let date = request.date.unwrap_or(today);
    let notes = normalize_notes(request.notes.as_deref());

    sqlx::query(
        r#"
        INSERT INTO activity_logs (id, user_id, family_member_id, activity_type, kilometers, date, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(request.family_member_id.to_string())
    .bind(request.activity_type.as_str())
    .bind(kilometers)
    .bind(date)
    .bind(&notes)
    .bind(now)
    .execute(pool)
    .await?;

    log::info!(
        "Logged {} km of {} for member {} on {}",
        kilometers,
        request.activity_type.as_str(),
        request.family_member_id,
        date
    );

    let streak =
        streaks::recalculate_member_streak(pool, locks, &request.family_member_id, today).await?;

    Ok(ActivityLogged {
        activity: ActivityLog {
            id,
            user_id: *user_id,
            family_member_id: request.family_member_id,
            activity_type: request.activity_type,
            kilometers,
            date,
            notes,
            created_at: now,
        },
        streak,
    })
}

/// Edit an activity and refresh the streaks of every member it touched
pub async fn update_activity(
    pool: &SqlitePool,
    locks: &MemberLocks,
    user_id: &Uuid,
    activity_id: &Uuid,
    request: &UpdateActivityRequest,
    today: NaiveDate,
) -> Result<ActivityLogged, ActivityLogError> {
    let mut activity = get_activity(pool, user_id, activity_id)
        .await?
        .ok_or(ActivityLogError::NotFound)?;
    let previous_member_id = activity.family_member_id;

    if let Some(member_id) = request.family_member_id {
        if !member_belongs_to(pool, user_id, &member_id).await? {
            return Err(ActivityLogError::MemberNotFound);
        }
        activity.family_member_id = member_id;
    }
    if let Some(activity_type) = request.activity_type {
        activity.activity_type = activity_type;
    }
    if let Some(kilometers) = request.kilometers {
        activity.kilometers = validate_kilometers(kilometers)?;
    }
    if let Some(date) = request.date {
        activity.date = date;
    }
    if let Some(ref notes) = request.notes {
        activity.notes = normalize_notes(Some(notes));
    }

    sqlx::query(
        r#"
        UPDATE activity_logs SET family_member_id = ?, activity_type = ?, kilometers = ?, date = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(activity.family_member_id.to_string())
    .bind(activity.activity_type.as_str())
    .bind(activity.kilometers)
    .bind(activity.date)
    .bind(&activity.notes)
    .bind(activity_id.to_string())
    .execute(pool)
    .await?;

    if previous_member_id != activity.family_member_id {
        streaks::recalculate_member_streak(pool, locks, &previous_member_id, today).await?;
    }
    let streak =
        streaks::recalculate_member_streak(pool, locks, &activity.family_member_id, today).await?;

    Ok(ActivityLogged { activity, streak })
}

pub async fn get_activity(
    pool: &SqlitePool,
    user_id: &Uuid,
    activity_id: &Uuid,
) -> Result<Option<ActivityLog>, ActivityLogError> {
    let log: Option<ActivityLogRow> =
        sqlx::query_as("SELECT * FROM activity_logs WHERE id = ? AND user_id = ?")
            .bind(activity_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(log.map(|l| l.to_shared()))
}

/// List activities of an account with member details, newest first
pub async fn list_activities(
    pool: &SqlitePool,
    user_id: &Uuid,
    filter: &ActivityFilter,
) -> Result<Vec<ActivityLogWithMember>, ActivityLogError> {
    let member_id = filter.family_member_id.map(|id| id.to_string());

    let rows: Vec<ActivityLogWithMemberRow> = sqlx::query_as(
        r#"
        SELECT
            al.id, al.user_id, al.family_member_id, al.activity_type, al.kilometers,
            al.date, al.notes, al.created_at,
            fm.name as member_name, fm.avatar as member_avatar
        FROM activity_logs al
        JOIN family_members fm ON al.family_member_id = fm.id
        WHERE al.user_id = ?
            AND (? IS NULL OR al.date = ?)
            AND (? IS NULL OR al.family_member_id = ?)
        ORDER BY al.date DESC, al.created_at DESC
        "#,
    )
    .bind(user_id.to_string())
    .bind(filter.date)
    .bind(filter.date)
    .bind(&member_id)
    .bind(&member_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.into_shared()).collect())
}

/// Every activity of an account, oldest first
pub async fn list_owner_logs(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Vec<ActivityLog>, ActivityLogError> {
    let rows: Vec<ActivityLogRow> = sqlx::query_as(
        "SELECT * FROM activity_logs WHERE user_id = ? ORDER BY date ASC, created_at ASC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|r| r.to_shared()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{date, insert_member, setup_test_db};
    use shared::ActivityType;

    fn request(member_id: Uuid, kilometers: f64, day: &str) -> CreateActivityRequest {
        CreateActivityRequest {
            family_member_id: member_id,
            activity_type: ActivityType::Running,
            kilometers,
            date: Some(date(day)),
            notes: None,
        }
    }

    async fn cached_streak(pool: &SqlitePool, member_id: &Uuid) -> (i64, String) {
        sqlx::query_as("SELECT streak, last_activity FROM family_members WHERE id = ?")
            .bind(member_id.to_string())
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn test_activity_log_error_display() {
        assert_eq!(ActivityLogError::NotFound.to_string(), "Activity log not found");
        assert_eq!(
            ActivityLogError::MemberNotFound.to_string(),
            "Family member not found"
        );
    }

    #[test]
    fn test_validate_kilometers() {
        assert!(validate_kilometers(0.0).is_ok());
        assert!(validate_kilometers(5.5).is_ok());
        assert!(validate_kilometers(-1.0).is_err());
        assert!(validate_kilometers(f64::NAN).is_err());
        assert!(validate_kilometers(f64::INFINITY).is_err());
    }

    #[test]
    fn test_normalize_notes() {
        assert_eq!(normalize_notes(Some("  nice run ")), Some("nice run".to_string()));
        assert_eq!(normalize_notes(Some("   ")), None);
        assert_eq!(normalize_notes(None), None);
    }

    #[tokio::test]
    async fn test_log_activity_updates_streak() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();
        let user_id = Uuid::new_v4();
        let member_id = insert_member(&pool, &user_id, "Freja").await;
        let today = date("2025-01-03");

        log_activity(&pool, &locks, &user_id, &request(member_id, 3.0, "2025-01-01"), today)
            .await
            .unwrap();
        log_activity(&pool, &locks, &user_id, &request(member_id, 4.0, "2025-01-02"), today)
            .await
            .unwrap();
        let logged = log_activity(&pool, &locks, &user_id, &request(member_id, 5.0, "2025-01-03"), today)
            .await
            .unwrap();

        assert_eq!(logged.activity.kilometers, 5.0);
        assert_eq!(logged.streak.current_streak, 3);
        assert_eq!(logged.streak.longest_streak, 3);
        assert_eq!(logged.streak.last_activity_label, "Today");
        assert_eq!(cached_streak(&pool, &member_id).await, (3, "Today".to_string()));
    }

    #[tokio::test]
    async fn test_log_activity_defaults_to_today() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();
        let user_id = Uuid::new_v4();
        let member_id = insert_member(&pool, &user_id, "Freja").await;
        let today = date("2025-02-10");

        let mut req = request(member_id, 2.0, "2025-01-01");
        req.date = None;
        req.notes = Some("  ".to_string());

        let logged = log_activity(&pool, &locks, &user_id, &req, today).await.unwrap();

        assert_eq!(logged.activity.date, today);
        assert!(logged.activity.notes.is_none());
    }

    #[tokio::test]
    async fn test_log_activity_for_foreign_member_is_rejected() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();
        let member_id = insert_member(&pool, &Uuid::new_v4(), "Freja").await;

        let result = log_activity(
            &pool,
            &locks,
            &Uuid::new_v4(),
            &request(member_id, 3.0, "2025-01-01"),
            date("2025-01-03"),
        )
        .await;

        assert!(matches!(result, Err(ActivityLogError::MemberNotFound)));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_log_activity_rejects_negative_distance() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();
        let user_id = Uuid::new_v4();
        let member_id = insert_member(&pool, &user_id, "Freja").await;

        let result = log_activity(
            &pool,
            &locks,
            &user_id,
            &request(member_id, -2.0, "2025-01-01"),
            date("2025-01-03"),
        )
        .await;

        assert!(matches!(result, Err(ActivityLogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_moving_activity_recalculates_both_members() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();
        let user_id = Uuid::new_v4();
        let first = insert_member(&pool, &user_id, "Anna").await;
        let second = insert_member(&pool, &user_id, "Bo").await;
        let today = date("2025-01-03");

        let logged = log_activity(&pool, &locks, &user_id, &request(first, 3.0, "2025-01-03"), today)
            .await
            .unwrap();
        assert_eq!(cached_streak(&pool, &first).await, (1, "Today".to_string()));

        let moved = update_activity(
            &pool,
            &locks,
            &user_id,
            &logged.activity.id,
            &UpdateActivityRequest {
                family_member_id: Some(second),
                date: Some(date("2025-01-02")),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();

        assert_eq!(moved.activity.family_member_id, second);
        assert_eq!(moved.streak.last_activity_label, "Yesterday");
        assert_eq!(cached_streak(&pool, &first).await, (0, "Never".to_string()));
        assert_eq!(cached_streak(&pool, &second).await, (1, "Yesterday".to_string()));
    }

    #[tokio::test]
    async fn test_update_unknown_activity() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();

        let result = update_activity(
            &pool,
            &locks,
            &Uuid::new_v4(),
            &Uuid::new_v4(),
            &UpdateActivityRequest::default(),
            date("2025-01-03"),
        )
        .await;

        assert!(matches!(result, Err(ActivityLogError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_activities_filters() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();
        let user_id = Uuid::new_v4();
        let first = insert_member(&pool, &user_id, "Anna").await;
        let second = insert_member(&pool, &user_id, "Bo").await;
        let today = date("2025-01-03");

        log_activity(&pool, &locks, &user_id, &request(first, 1.0, "2025-01-02"), today)
            .await
            .unwrap();
        log_activity(&pool, &locks, &user_id, &request(first, 2.0, "2025-01-03"), today)
            .await
            .unwrap();
        log_activity(&pool, &locks, &user_id, &request(second, 3.0, "2025-01-03"), today)
            .await
            .unwrap();

        let all = list_activities(&pool, &user_id, &ActivityFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].log.date, date("2025-01-02"));
        assert_eq!(all[2].member_name, "Anna");

        let on_day = list_activities(
            &pool,
            &user_id,
            &ActivityFilter {
                date: Some(today),
                family_member_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(on_day.len(), 2);

        let for_member = list_activities(
            &pool,
            &user_id,
            &ActivityFilter {
                date: Some(today),
                family_member_id: Some(second),
            },
        )
        .await
        .unwrap();
        assert_eq!(for_member.len(), 1);
        assert_eq!(for_member[0].member_name, "Bo");

        let foreign = list_activities(&pool, &Uuid::new_v4(), &ActivityFilter::default())
            .await
            .unwrap();
        assert!(foreign.is_empty());

        let logs = list_owner_logs(&pool, &user_id).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].date, date("2025-01-02"));
    }
}

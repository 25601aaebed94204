use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tokio::time;

use crate::models::parse_stored_uuid;
use crate::services::member_locks::MemberLocks;
use crate::services::streaks;

#[derive(Debug, Error)]
pub enum BackgroundJobError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Report from refreshing the cached streak fields
#[derive(Debug, Clone)]
pub struct StreakRefreshReport {
    pub processed_at: DateTime<Utc>,
    pub members_checked: i64,
    pub members_updated: i64,
    pub members_failed: i64,
}

/// Configuration for the background job scheduler
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Local hour of day to run the streak refresh (0-23)
    pub refresh_hour: u32,
    /// Minute of hour to run the refresh (0-59)
    pub refresh_minute: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            refresh_hour: 0,
            refresh_minute: 5,
        }
    }
}

/// Resolve a local wall-clock time to an instant
///
/// Ambiguous times (clocks going back) take the first occurrence. Times inside
/// a gap (clocks going forward) move one hour later.
fn resolve_local(timezone: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    timezone
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            timezone
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest()
        })
}

/// Time to sleep from `now` until the next scheduled run in the same timezone
pub fn duration_until_next_run(now: DateTime<Tz>, config: &JobConfig) -> std::time::Duration {
    let fallback = std::time::Duration::from_secs(3600);
    let timezone = now.timezone();
    let today = now.date_naive();

    [Some(today), today.succ_opt()]
        .into_iter()
        .flatten()
        .filter_map(|day| day.and_hms_opt(config.refresh_hour, config.refresh_minute, 0))
        .filter_map(|local| resolve_local(&timezone, local))
        .find(|run| *run > now)
        .and_then(|run| (run - now).to_std().ok())
        .unwrap_or(fallback)
}

/// Start the background job scheduler
///
/// Once a day, shortly after local midnight, every member's cached label and
/// current streak are re-derived so "Today" turns into "Yesterday" without
/// waiting for the next logged activity.
pub async fn start_scheduler(
    pool: Arc<SqlitePool>,
    locks: Arc<MemberLocks>,
    timezone: Tz,
    config: JobConfig,
) {
    log::info!(
        "Background job scheduler started. Streak refresh scheduled for {:02}:{:02} ({})",
        config.refresh_hour,
        config.refresh_minute,
        timezone
    );

    loop {
        let sleep_duration = duration_until_next_run(Utc::now().with_timezone(&timezone), &config);

        log::debug!(
            "Next streak refresh scheduled in {} seconds",
            sleep_duration.as_secs()
        );

        time::sleep(sleep_duration).await;

        let today = Utc::now().with_timezone(&timezone).date_naive();
        match refresh_all_member_streaks(&pool, &locks, today).await {
            Ok(report) => {
                log::info!(
                    "Streak refresh complete at {}: checked {} members, updated {}, failed {}",
                    report.processed_at,
                    report.members_checked,
                    report.members_updated,
                    report.members_failed
                );
            }
            Err(e) => {
                log::error!("Error refreshing streaks: {}", e);
            }
        }
    }
}

/// Recalculate the cached streak fields of every member
///
/// A failing member is logged and counted; the rest are still processed.
pub async fn refresh_all_member_streaks(
    pool: &SqlitePool,
    locks: &MemberLocks,
    today: NaiveDate,
) -> Result<StreakRefreshReport, BackgroundJobError> {
    let members: Vec<(String, i64, String)> =
        sqlx::query_as("SELECT id, streak, last_activity FROM family_members")
            .fetch_all(pool)
            .await?;

    let mut members_checked: i64 = 0;
    let mut members_updated: i64 = 0;
    let mut members_failed: i64 = 0;

    for (id, streak, last_activity) in members {
        members_checked += 1;
        let member_id = parse_stored_uuid(&id);

        match streaks::recalculate_member_streak(pool, locks, &member_id, today).await {
            Ok(result) => {
                if i64::from(result.current_streak) != streak
                    || result.last_activity_label != last_activity
                {
                    members_updated += 1;
                }
            }
            Err(e) => {
                members_failed += 1;
                log::error!("Failed to refresh streak for member {}: {}", member_id, e);
            }
        }
    }

    Ok(StreakRefreshReport {
        processed_at: Utc::now(),
        members_checked,
        members_updated,
        members_failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::family_members;
    use crate::test_utils::{date, insert_activity, insert_member, setup_test_db};
    use uuid::Uuid;

    #[test]
    fn test_job_config_default() {
        let config = JobConfig::default();
        assert_eq!(config.refresh_hour, 0);
        assert_eq!(config.refresh_minute, 5);
    }

    #[test]
    fn test_background_job_error_display() {
        let err = BackgroundJobError::DatabaseError(sqlx::Error::RowNotFound);
        assert!(err.to_string().contains("Database error"));
    }

    #[test]
    fn test_duration_until_next_run_later_today() {
        let now = chrono_tz::Europe::Copenhagen
            .with_ymd_and_hms(2025, 6, 10, 22, 0, 0)
            .unwrap();
        let config = JobConfig {
            refresh_hour: 23,
            refresh_minute: 30,
        };

        assert_eq!(
            duration_until_next_run(now, &config),
            std::time::Duration::from_secs(90 * 60)
        );
    }

    #[test]
    fn test_duration_until_next_run_tomorrow() {
        let now = chrono_tz::Europe::Copenhagen
            .with_ymd_and_hms(2025, 6, 10, 0, 10, 0)
            .unwrap();

        assert_eq!(
            duration_until_next_run(now, &JobConfig::default()),
            std::time::Duration::from_secs(24 * 3600 - 5 * 60)
        );
    }

    #[test]
    fn test_duration_until_next_run_across_spring_forward() {
        // 2025-03-30: Copenhagen jumps from 02:00 CET to 03:00 CEST
        let now = chrono_tz::Europe::Copenhagen
            .with_ymd_and_hms(2025, 3, 30, 0, 30, 0)
            .unwrap();
        let config = JobConfig {
            refresh_hour: 4,
            refresh_minute: 0,
        };

        assert_eq!(
            duration_until_next_run(now, &config),
            std::time::Duration::from_secs(150 * 60)
        );
    }

    #[test]
    fn test_duration_until_next_run_across_fall_back() {
        // 2025-10-26: Copenhagen goes from 03:00 CEST back to 02:00 CET
        let now = chrono_tz::Europe::Copenhagen
            .with_ymd_and_hms(2025, 10, 26, 0, 30, 0)
            .unwrap();
        let config = JobConfig {
            refresh_hour: 4,
            refresh_minute: 0,
        };

        assert_eq!(
            duration_until_next_run(now, &config),
            std::time::Duration::from_secs(270 * 60)
        );
    }

    #[test]
    fn test_duration_until_next_run_inside_skipped_hour() {
        let now = chrono_tz::Europe::Copenhagen
            .with_ymd_and_hms(2025, 3, 30, 0, 30, 0)
            .unwrap();
        let config = JobConfig {
            refresh_hour: 2,
            refresh_minute: 30,
        };

        // 02:30 does not exist that night; the run happens at 03:30 CEST
        assert_eq!(
            duration_until_next_run(now, &config),
            std::time::Duration::from_secs(120 * 60)
        );
    }

    #[tokio::test]
    async fn test_refresh_rolls_labels_forward() {
        let pool = setup_test_db().await;
        let locks = MemberLocks::new();
        let user_id = Uuid::new_v4();
        let anna = insert_member(&pool, &user_id, "Anna").await;
        let bo = insert_member(&pool, &user_id, "Bo").await;
        insert_activity(&pool, &user_id, &anna, "walking", 2.0, "2025-01-02").await;
        insert_activity(&pool, &user_id, &anna, "walking", 2.0, "2025-01-03").await;

        streaks::recalculate_member_streak(&pool, &locks, &anna, date("2025-01-03"))
            .await
            .unwrap();

        let report = refresh_all_member_streaks(&pool, &locks, date("2025-01-04"))
            .await
            .unwrap();

        assert_eq!(report.members_checked, 2);
        assert_eq!(report.members_updated, 1);
        assert_eq!(report.members_failed, 0);

        let anna = family_members::get_member(&pool, &anna).await.unwrap().unwrap();
        assert_eq!(anna.last_activity, "Yesterday");
        assert_eq!(anna.streak, 2);

        let bo = family_members::get_member(&pool, &bo).await.unwrap().unwrap();
        assert_eq!(bo.last_activity, "Never");
        assert_eq!(bo.streak, 0);
    }

    #[tokio::test]
    async fn test_refresh_without_members() {
        let pool = setup_test_db().await;
        let report = refresh_all_member_streaks(&pool, &MemberLocks::new(), date("2025-01-04"))
            .await
            .unwrap();

        assert_eq!(report.members_checked, 0);
        assert_eq!(report.members_updated, 0);
    }
}

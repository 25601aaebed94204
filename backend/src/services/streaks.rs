use chrono::{NaiveDate, Utc};
use shared::{StreakResult, LAST_ACTIVITY_TODAY, LAST_ACTIVITY_YESTERDAY};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::future::Future;
use thiserror::Error;
use uuid::Uuid;

use crate::models::parse_stored_uuid;
use crate::services::member_locks::MemberLocks;

/// Calendar dates are exchanged as plain `YYYY-MM-DD` text
const DATE_FORMAT: &str = "%Y-%m-%d";
/// Short month and day, e.g. "Mar 5"
const LABEL_FORMAT: &str = "%b %-d";

#[derive(Debug, Error)]
pub enum StreakError {
    #[error("Family member not found")]
    MemberNotFound,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// The two cached fields mirrored onto a family member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStreakFields {
    pub streak: u32,
    pub last_activity: String,
}

impl From<&StreakResult> for MemberStreakFields {
    fn from(result: &StreakResult) -> Self {
        Self {
            streak: result.current_streak,
            last_activity: result.last_activity_label.clone(),
        }
    }
}

/// Storage operations the streak recalculation depends on
pub trait StreakStore {
    /// All activity dates of a member, in any order, duplicates allowed
    fn fetch_activity_dates(
        &self,
        member_id: &Uuid,
    ) -> impl Future<Output = Result<Vec<String>, StreakError>> + Send;

    /// Persist both cached fields at once
    fn write_member_streak_fields(
        &self,
        member_id: &Uuid,
        fields: &MemberStreakFields,
    ) -> impl Future<Output = Result<(), StreakError>> + Send;
}

impl StreakStore for SqlitePool {
    async fn fetch_activity_dates(&self, member_id: &Uuid) -> Result<Vec<String>, StreakError> {
        let dates: Vec<String> = sqlx::query_scalar(
            "SELECT date FROM activity_logs WHERE family_member_id = ? ORDER BY date ASC",
        )
        .bind(member_id.to_string())
        .fetch_all(self)
        .await?;

        Ok(dates)
    }

    async fn write_member_streak_fields(
        &self,
        member_id: &Uuid,
        fields: &MemberStreakFields,
    ) -> Result<(), StreakError> {
        let result = sqlx::query(
            "UPDATE family_members SET streak = ?, last_activity = ?, updated_at = ? WHERE id = ?",
        )
        .bind(i64::from(fields.streak))
        .bind(&fields.last_activity)
        .bind(Utc::now())
        .bind(member_id.to_string())
        .execute(self)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StreakError::MemberNotFound);
        }

        Ok(())
    }
}

/// Parse stored activity dates, skipping entries that are not `YYYY-MM-DD`
pub fn parse_activity_dates<S: AsRef<str>>(raw: &[S]) -> Vec<NaiveDate> {
    raw.iter()
        .filter_map(|value| {
            let value = value.as_ref();
            match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(e) => {
                    log::warn!("Skipping unparseable activity date '{}': {}", value, e);
                    None
                }
            }
        })
        .collect()
}

/// Human label for the most recent activity date
pub fn last_activity_label(last: NaiveDate, today: NaiveDate) -> String {
    if last == today {
        LAST_ACTIVITY_TODAY.to_string()
    } else if last.succ_opt() == Some(today) {
        LAST_ACTIVITY_YESTERDAY.to_string()
    } else {
        last.format(LABEL_FORMAT).to_string()
    }
}

/// Derive current streak, longest streak and last-activity label from a date history
///
/// Input order and duplicates do not matter. `today` only affects the label; the
/// current streak is the run ending at the most recent activity even if that run
/// has since been broken by inactivity.
pub fn calculate_streaks(dates: &[NaiveDate], today: NaiveDate) -> StreakResult {
    let unique: Vec<NaiveDate> = dates
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let Some(&last) = unique.last() else {
        return StreakResult::never();
    };

    let mut longest = 1u32;
    let mut run = 1u32;
    for pair in unique.windows(2) {
        if pair[0].succ_opt() == Some(pair[1]) {
            run += 1;
        } else {
            longest = longest.max(run);
            run = 1;
        }
    }
    longest = longest.max(run);

    // The run still open after the walk is the one ending at the most recent date
    let current = run;

    StreakResult {
        current_streak: current,
        longest_streak: longest,
        last_activity_label: last_activity_label(last, today),
    }
}

/// Re-derive a member's cached streak fields from their complete history
///
/// Recalculations for the same member are serialized. A failed fetch leaves the
/// stored fields untouched; both fields are written together or not at all.
pub async fn recalculate_member_streak<S: StreakStore>(
    store: &S,
    locks: &MemberLocks,
    member_id: &Uuid,
    today: NaiveDate,
) -> Result<StreakResult, StreakError> {
    let _guard = locks.lock(member_id).await;

    let raw_dates = store.fetch_activity_dates(member_id).await?;
    let result = calculate_streaks(&parse_activity_dates(&raw_dates), today);

    store
        .write_member_streak_fields(member_id, &MemberStreakFields::from(&result))
        .await?;

    log::debug!(
        "Recalculated streak for member {}: current={} longest={} last_activity={}",
        member_id,
        result.current_streak,
        result.longest_streak,
        result.last_activity_label
    );

    Ok(result)
}

/// Compute a member's streaks without touching the cached fields
pub async fn member_streak(
    pool: &SqlitePool,
    member_id: &Uuid,
    today: NaiveDate,
) -> Result<StreakResult, StreakError> {
    let raw_dates = pool.fetch_activity_dates(member_id).await?;
    Ok(calculate_streaks(&parse_activity_dates(&raw_dates), today))
}

/// Outcome of rebuilding an account's cached streak fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakRebuildReport {
    pub members_rebuilt: usize,
    pub members_failed: usize,
}

/// Rebuild the cached streak fields of every member of an account
///
/// A member that fails is logged and counted; the others are still rebuilt.
pub async fn rebuild_owner_streaks(
    pool: &SqlitePool,
    locks: &MemberLocks,
    user_id: &Uuid,
    today: NaiveDate,
) -> Result<StreakRebuildReport, StreakError> {
    let member_ids: Vec<String> =
        sqlx::query_scalar("SELECT id FROM family_members WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(pool)
            .await?;

    let mut report = StreakRebuildReport::default();
    for raw_id in &member_ids {
        let member_id = parse_stored_uuid(raw_id);
        match recalculate_member_streak(pool, locks, &member_id, today).await {
            Ok(_) => report.members_rebuilt += 1,
            Err(e) => {
                report.members_failed += 1;
                log::error!("Failed to rebuild streak for member {}: {}", raw_id, e);
            }
        }
    }

    log::info!(
        "Rebuilt streaks for {} members of account {} ({} failed)",
        report.members_rebuilt,
        user_id,
        report.members_failed
    );

    Ok(report)
}

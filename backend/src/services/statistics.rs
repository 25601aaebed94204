use chrono::NaiveDate;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::services::activity_logs::{self as activity_service, ActivityFilter, ActivityLogError};
use crate::services::family_members::{self as member_service, FamilyMemberError};
use crate::services::streaks;
use shared::{
    ActivityBreakdown, ActivityLog, ActivityType, ActivityTypeTotal, DaySummary, FamilyMember,
    MemberBreakdown, LAST_ACTIVITY_TODAY,
};

#[derive(Debug, Error)]
pub enum StatisticsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Family member error: {0}")]
    Member(#[from] FamilyMemberError),
    #[error("Activity log error: {0}")]
    Activity(#[from] ActivityLogError),
}

/// Share of `part` in `total` as a rounded percentage, 0 when nothing was logged
pub fn percent_of(part: f64, total: f64) -> i64 {
    if total <= 0.0 {
        return 0;
    }
    (part / total * 100.0).round() as i64
}

/// Kilometers per distance activity type, in the fixed type order; types never logged are left out
fn totals_by_type(logs: &[&ActivityLog]) -> Vec<ActivityTypeTotal> {
    let total = total_distance(logs);

    ActivityType::ALL
        .iter()
        .filter(|activity_type| activity_type.is_distance())
        .filter_map(|activity_type| {
            let matching: Vec<&&ActivityLog> = logs
                .iter()
                .filter(|log| log.activity_type == *activity_type)
                .collect();
            if matching.is_empty() {
                return None;
            }
            let kilometers: f64 = matching.iter().map(|log| log.kilometers).sum();
            Some(ActivityTypeTotal {
                activity_type: *activity_type,
                kilometers,
                percent: percent_of(kilometers, total),
            })
        })
        .collect()
}

/// Summed kilometers, skipping trip-counted activities
fn total_distance(logs: &[&ActivityLog]) -> f64 {
    logs.iter()
        .filter(|log| log.activity_type.is_distance())
        .map(|log| log.kilometers)
        .sum()
}

/// Distance split by activity type for the whole family and for each member
pub fn activity_breakdown(members: &[FamilyMember], logs: &[ActivityLog]) -> ActivityBreakdown {
    let all: Vec<&ActivityLog> = logs.iter().collect();

    let member_breakdowns = members
        .iter()
        .map(|member| {
            let own: Vec<&ActivityLog> = logs
                .iter()
                .filter(|log| log.family_member_id == member.id)
                .collect();
            MemberBreakdown {
                member_id: member.id,
                name: member.name.clone(),
                total_km: total_distance(&own),
                by_type: totals_by_type(&own),
            }
        })
        .collect();

    ActivityBreakdown {
        total_km: total_distance(&all),
        by_type: totals_by_type(&all),
        members: member_breakdowns,
    }
}

/// Members whose cached label says they were active today
///
/// Reads the cached label, so it is only as fresh as the last recalculation.
pub fn active_today(members: Vec<FamilyMember>) -> Vec<FamilyMember> {
    members
        .into_iter()
        .filter(|member| member.last_activity == LAST_ACTIVITY_TODAY)
        .collect()
}

pub async fn get_activity_breakdown(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<ActivityBreakdown, StatisticsError> {
    let members = member_service::list_members(pool, user_id).await?;
    let logs = activity_service::list_owner_logs(pool, user_id).await?;
    Ok(activity_breakdown(&members, &logs))
}

pub async fn get_active_today(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Vec<FamilyMember>, StatisticsError> {
    let members = member_service::list_members(pool, user_id).await?;
    Ok(active_today(members))
}

/// Activities of one day plus every date the account has any activity on
pub async fn get_day_summary(
    pool: &SqlitePool,
    user_id: &Uuid,
    date: NaiveDate,
) -> Result<DaySummary, StatisticsError> {
    let activities = activity_service::list_activities(
        pool,
        user_id,
        &ActivityFilter {
            date: Some(date),
            family_member_id: None,
        },
    )
    .await?;

    let total_km = activities
        .iter()
        .filter(|a| a.log.activity_type.is_distance())
        .map(|a| a.log.kilometers)
        .sum();

    let raw_dates: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT date FROM activity_logs WHERE user_id = ? ORDER BY date ASC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(DaySummary {
        date,
        activities,
        total_km,
        active_dates: streaks::parse_activity_dates(&raw_dates),
    })
}

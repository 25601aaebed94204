use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::services::activity_logs::{self as activity_service, ActivityLogError};
use crate::services::family_members::{self as member_service, FamilyMemberError};
use crate::services::streaks;
use shared::{
    ActivityLeaderboardEntry, ActivityLog, ActivityType, DistanceLeaderboardEntry, FamilyMember,
    LeaderboardScope, StreakLeaderboardEntry,
};

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Family member error: {0}")]
    Member(#[from] FamilyMemberError),
    #[error("Activity log error: {0}")]
    Activity(#[from] ActivityLogError),
}

fn rank(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Higher totals first, ties in name order
fn by_total_then_name(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Members ranked by total distance; trip-counted activities are left out
pub fn distance_leaderboard(
    members: &[FamilyMember],
    logs: &[ActivityLog],
) -> Vec<DistanceLeaderboardEntry> {
    let mut entries: Vec<DistanceLeaderboardEntry> = members
        .iter()
        .map(|member| {
            let mut entry = DistanceLeaderboardEntry {
                rank: 0,
                member_id: member.id,
                name: member.name.clone(),
                avatar: member.avatar.clone(),
                total_km: 0.0,
                walking_km: 0.0,
                running_km: 0.0,
                cycling_km: 0.0,
                streak: member.streak,
                last_activity: member.last_activity.clone(),
            };

            for log in logs
                .iter()
                .filter(|log| log.family_member_id == member.id)
                .filter(|log| log.activity_type.is_distance())
            {
                entry.total_km += log.kilometers;
                match log.activity_type {
                    ActivityType::Walking => entry.walking_km += log.kilometers,
                    ActivityType::Running => entry.running_km += log.kilometers,
                    ActivityType::Cycling => entry.cycling_km += log.kilometers,
                    _ => {}
                }
            }

            entry
        })
        .collect();

    entries.sort_by(|a, b| by_total_then_name((a.total_km, &a.name), (b.total_km, &b.name)));
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = rank(index);
    }

    entries
}

/// Members ranked by the longest streak found anywhere in their history
pub fn streak_leaderboard(
    members: &[FamilyMember],
    logs: &[ActivityLog],
    today: NaiveDate,
) -> Vec<StreakLeaderboardEntry> {
    let mut dates_by_member: HashMap<Uuid, Vec<NaiveDate>> = HashMap::new();
    for log in logs {
        dates_by_member
            .entry(log.family_member_id)
            .or_default()
            .push(log.date);
    }

    let mut entries: Vec<StreakLeaderboardEntry> = members
        .iter()
        .map(|member| {
            let dates = dates_by_member
                .get(&member.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let result = streaks::calculate_streaks(dates, today);

            StreakLeaderboardEntry {
                rank: 0,
                member_id: member.id,
                name: member.name.clone(),
                avatar: member.avatar.clone(),
                longest_streak: result.longest_streak,
                current_streak: result.current_streak,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.longest_streak
            .cmp(&a.longest_streak)
            .then_with(|| a.name.cmp(&b.name))
    });
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = rank(index);
    }

    entries
}

/// Members ranked by their total for one activity type; members without any are left out
pub fn activity_leaderboard(
    members: &[FamilyMember],
    logs: &[ActivityLog],
    activity_type: ActivityType,
    scope: LeaderboardScope,
    today: NaiveDate,
) -> Vec<ActivityLeaderboardEntry> {
    let mut totals: HashMap<Uuid, f64> = HashMap::new();
    for log in logs
        .iter()
        .filter(|log| log.activity_type == activity_type)
        .filter(|log| scope == LeaderboardScope::AllTime || log.date == today)
    {
        *totals.entry(log.family_member_id).or_default() += log.kilometers;
    }

    let mut entries: Vec<ActivityLeaderboardEntry> = members
        .iter()
        .filter_map(|member| {
            totals.get(&member.id).map(|total| ActivityLeaderboardEntry {
                rank: 0,
                member_id: member.id,
                name: member.name.clone(),
                avatar: member.avatar.clone(),
                total: *total,
            })
        })
        .collect();

    entries.sort_by(|a, b| by_total_then_name((a.total, &a.name), (b.total, &b.name)));
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = rank(index);
    }

    entries
}

async fn load_family(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<(Vec<FamilyMember>, Vec<ActivityLog>), LeaderboardError> {
    let members = member_service::list_members(pool, user_id).await?;
    let logs = activity_service::list_owner_logs(pool, user_id).await?;
    Ok((members, logs))
}

pub async fn get_distance_leaderboard(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Vec<DistanceLeaderboardEntry>, LeaderboardError> {
    let (members, logs) = load_family(pool, user_id).await?;
    Ok(distance_leaderboard(&members, &logs))
}

pub async fn get_streak_leaderboard(
    pool: &SqlitePool,
    user_id: &Uuid,
    today: NaiveDate,
) -> Result<Vec<StreakLeaderboardEntry>, LeaderboardError> {
    let (members, logs) = load_family(pool, user_id).await?;
    Ok(streak_leaderboard(&members, &logs, today))
}

pub async fn get_activity_leaderboard(
    pool: &SqlitePool,
    user_id: &Uuid,
    activity_type: ActivityType,
    scope: LeaderboardScope,
    today: NaiveDate,
) -> Result<Vec<ActivityLeaderboardEntry>, LeaderboardError> {
    let (members, logs) = load_family(pool, user_id).await?;
    Ok(activity_leaderboard(&members, &logs, activity_type, scope, today))
}

use chrono::{Days, Months, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ActivityLogRow, ChallengeRow, FamilyMemberRow};
use shared::{
    ActivityLog, Challenge, ChallengeDuration, ChallengeProgress, CreateChallengeRequest,
    FamilyMember,
};

#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("Challenge not found")]
    NotFound,
    #[error("Invalid challenge: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Last day (inclusive) of a challenge starting on `start`
pub fn challenge_end_date(
    start: NaiveDate,
    duration: ChallengeDuration,
    custom_end: Option<NaiveDate>,
) -> Result<NaiveDate, ChallengeError> {
    let end = match duration {
        ChallengeDuration::OneWeek => start.checked_add_days(Days::new(6)),
        ChallengeDuration::TwoWeeks => start.checked_add_days(Days::new(13)),
        ChallengeDuration::OneMonth => start
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt()),
        ChallengeDuration::ThreeMonths => start
            .checked_add_months(Months::new(3))
            .and_then(|d| d.pred_opt()),
        ChallengeDuration::Custom => {
            let end = custom_end.ok_or_else(|| {
                ChallengeError::Validation("Custom challenges need an end date".to_string())
            })?;
            if end < start {
                return Err(ChallengeError::Validation(
                    "End date must not be before the start date".to_string(),
                ));
            }
            Some(end)
        }
    };

    end.ok_or_else(|| ChallengeError::Validation("Challenge end date is out of range".to_string()))
}

pub async fn create_challenge(
    pool: &SqlitePool,
    user_id: &Uuid,
    request: &CreateChallengeRequest,
    today: NaiveDate,
) -> Result<Challenge, ChallengeError> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ChallengeError::Validation("Title must not be empty".to_string()));
    }
    if !request.goal_km.is_finite() || request.goal_km <= 0.0 {
        return Err(ChallengeError::Validation(
            "Goal must be a positive number of kilometers".to_string(),
        ));
    }

    let start_date = request.start_date.unwrap_or(today);
    let end_date = challenge_end_date(start_date, request.duration, request.end_date)?;
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO challenges (id, user_id, title, description, activity_type, goal_km, start_date, end_date, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(&title)
    .bind(&description)
    .bind(request.activity_type.map(|t| t.as_str()))
    .bind(request.goal_km)
    .bind(start_date)
    .bind(end_date)
    .bind(now)
    .execute(pool)
    .await?;

    log::info!(
        "Created challenge '{}' ({} to {}) for account {}",
        title,
        start_date,
        end_date,
        user_id
    );

    Ok(Challenge {
        id,
        user_id: *user_id,
        title,
        description,
        activity_type: request.activity_type,
        goal_km: request.goal_km,
        start_date,
        end_date,
        created_at: now,
    })
}

pub async fn get_challenge(
    pool: &SqlitePool,
    user_id: &Uuid,
    challenge_id: &Uuid,
) -> Result<Option<Challenge>, ChallengeError> {
    let challenge: Option<ChallengeRow> =
        sqlx::query_as("SELECT * FROM challenges WHERE id = ? AND user_id = ?")
            .bind(challenge_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(challenge.map(|c| c.to_shared()))
}

/// List challenges, most recently ending first
pub async fn list_challenges(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Vec<Challenge>, ChallengeError> {
    let challenges: Vec<ChallengeRow> = sqlx::query_as(
        "SELECT * FROM challenges WHERE user_id = ? ORDER BY end_date DESC, created_at DESC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(challenges.iter().map(|c| c.to_shared()).collect())
}

/// Summarize a challenge from the member list and the logs inside its window
///
/// A challenge open to every activity type only counts distance activities.
pub fn compute_progress(
    challenge: Challenge,
    members: &[FamilyMember],
    logs: &[ActivityLog],
    today: NaiveDate,
) -> ChallengeProgress {
    let counted: Vec<&ActivityLog> = logs
        .iter()
        .filter(|log| log.date >= challenge.start_date && log.date <= challenge.end_date)
        .filter(|log| {
            challenge
                .activity_type
                .map_or(log.activity_type.is_distance(), |activity_type| {
                    log.activity_type == activity_type
                })
        })
        .collect();

    let total_km: f64 = counted.iter().map(|log| log.kilometers).sum();
    let active_today: HashSet<Uuid> = counted
        .iter()
        .filter(|log| log.date == today)
        .map(|log| log.family_member_id)
        .collect();

    let progress_percent = (total_km / challenge.goal_km * 100.0).round() as i64;
    let days_left = challenge
        .end_date
        .signed_duration_since(today)
        .num_days()
        .max(0);
    let is_active = challenge.start_date <= today && today <= challenge.end_date;

    ChallengeProgress {
        total_km,
        progress_percent,
        days_left,
        member_count: members.len() as i64,
        active_today: active_today.len() as i64,
        best_streak: members.iter().map(|m| m.streak).max().unwrap_or(0),
        is_active,
        challenge,
    }
}

pub async fn get_challenge_progress(
    pool: &SqlitePool,
    user_id: &Uuid,
    challenge_id: &Uuid,
    today: NaiveDate,
) -> Result<ChallengeProgress, ChallengeError> {
    let challenge = get_challenge(pool, user_id, challenge_id)
        .await?
        .ok_or(ChallengeError::NotFound)?;

    let members: Vec<FamilyMemberRow> =
        sqlx::query_as("SELECT * FROM family_members WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_all(pool)
            .await?;

    let logs: Vec<ActivityLogRow> = sqlx::query_as(
        "SELECT * FROM activity_logs WHERE user_id = ? AND date >= ? AND date <= ?",
    )
    .bind(user_id.to_string())
    .bind(challenge.start_date)
    .bind(challenge.end_date)
    .fetch_all(pool)
    .await?;

    let members: Vec<FamilyMember> = members.iter().map(|m| m.to_shared()).collect();
    let logs: Vec<ActivityLog> = logs.iter().map(|l| l.to_shared()).collect();

    Ok(compute_progress(challenge, &members, &logs, today))
}

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::FamilyMemberRow;
use shared::{
    CreateFamilyMemberRequest, FamilyMember, UpdateFamilyMemberRequest, LAST_ACTIVITY_NEVER,
};

const MIN_AGE: i32 = 1;
const MAX_AGE: i32 = 120;

#[derive(Debug, Error)]
pub enum FamilyMemberError {
    #[error("Family member not found")]
    NotFound,
    #[error("Invalid family member: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

fn validate_name(name: &str) -> Result<String, FamilyMemberError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FamilyMemberError::Validation("Name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

fn validate_age(age: i32) -> Result<i32, FamilyMemberError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(FamilyMemberError::Validation(format!(
            "Age must be between {} and {}",
            MIN_AGE, MAX_AGE
        )));
    }
    Ok(age)
}

/// Avatar shown when none is given: the first letter of the name
pub fn default_avatar(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default()
}

pub async fn create_member(
    pool: &SqlitePool,
    user_id: &Uuid,
    request: &CreateFamilyMemberRequest,
) -> Result<FamilyMember, FamilyMemberError> {
    let name = validate_name(&request.name)?;
    let age = validate_age(request.age)?;
    let avatar = request
        .avatar
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_avatar(&name));

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO family_members (id, user_id, name, gender, age, avatar, streak, last_activity, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(&name)
    .bind(request.gender.as_str())
    .bind(age)
    .bind(&avatar)
    .bind(LAST_ACTIVITY_NEVER)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    log::info!("Created family member {} for account {}", id, user_id);

    Ok(FamilyMember {
        id,
        user_id: *user_id,
        name,
        gender: request.gender,
        age,
        avatar,
        streak: 0,
        last_activity: LAST_ACTIVITY_NEVER.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_member(
    pool: &SqlitePool,
    member_id: &Uuid,
) -> Result<Option<FamilyMember>, FamilyMemberError> {
    let member: Option<FamilyMemberRow> =
        sqlx::query_as("SELECT * FROM family_members WHERE id = ?")
            .bind(member_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(member.map(|m| m.to_shared()))
}

/// Get a member only if it belongs to the given account
pub async fn get_owned_member(
    pool: &SqlitePool,
    user_id: &Uuid,
    member_id: &Uuid,
) -> Result<Option<FamilyMember>, FamilyMemberError> {
    Ok(get_member(pool, member_id)
        .await?
        .filter(|member| member.user_id == *user_id))
}

pub async fn list_members(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Vec<FamilyMember>, FamilyMemberError> {
    let members: Vec<FamilyMemberRow> = sqlx::query_as(
        "SELECT * FROM family_members WHERE user_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(members.iter().map(|m| m.to_shared()).collect())
}

/// Update profile fields; the cached streak fields are never edited here
pub async fn update_member(
    pool: &SqlitePool,
    user_id: &Uuid,
    member_id: &Uuid,
    request: &UpdateFamilyMemberRequest,
) -> Result<FamilyMember, FamilyMemberError> {
    let mut member = get_owned_member(pool, user_id, member_id)
        .await?
        .ok_or(FamilyMemberError::NotFound)?;

    if let Some(ref name) = request.name {
        member.name = validate_name(name)?;
    }
    if let Some(gender) = request.gender {
        member.gender = gender;
    }
    if let Some(age) = request.age {
        member.age = validate_age(age)?;
    }
    if let Some(ref avatar) = request.avatar {
        let avatar = avatar.trim();
        member.avatar = if avatar.is_empty() {
            default_avatar(&member.name)
        } else {
            avatar.to_string()
        };
    }

    member.updated_at = Utc::now();

    sqlx::query(
        "UPDATE family_members SET name = ?, gender = ?, age = ?, avatar = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&member.name)
    .bind(member.gender.as_str())
    .bind(member.age)
    .bind(&member.avatar)
    .bind(member.updated_at)
    .bind(member_id.to_string())
    .execute(pool)
    .await?;

    Ok(member)
}

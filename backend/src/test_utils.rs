//! Helpers for tests that need a real database

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;

/// In-memory database with all migrations applied
///
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    pool
}

pub async fn insert_member(pool: &SqlitePool, user_id: &Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO family_members (id, user_id, name, gender, age, avatar, streak, last_activity, created_at, updated_at)
        VALUES (?, ?, ?, 'other', 30, ?, 0, 'Never', ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(name)
    .bind(name.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    id
}

pub async fn insert_activity(
    pool: &SqlitePool,
    user_id: &Uuid,
    member_id: &Uuid,
    activity_type: &str,
    kilometers: f64,
    date: &str,
) -> Uuid {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO activity_logs (id, user_id, family_member_id, activity_type, kilometers, date, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, NULL, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(member_id.to_string())
    .bind(activity_type)
    .bind(kilometers)
    .bind(date)
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();

    id
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Bearer token for an account, valid for a day
pub fn create_jwt(user_id: &Uuid, secret: &str) -> String {
    use crate::services::auth::Claims;
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + chrono::Duration::hours(24)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Configuration for handler tests, independent of the environment
pub fn test_config(jwt_secret: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: jwt_secret.to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        timezone: chrono_tz::UTC,
        streak_refresh_hour: 0,
        streak_refresh_minute: 5,
    }
}

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    /// Time zone that defines calendar days for streaks
    pub timezone: Tz,
    pub streak_refresh_hour: u32,
    pub streak_refresh_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", "8080")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:challenge.db?mode=rwc".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-secret-key-change-in-production".to_string()),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            timezone: parse_var("TIMEZONE", "UTC")?,
            streak_refresh_hour: parse_bounded("STREAK_REFRESH_HOUR", "0", 23)?,
            streak_refresh_minute: parse_bounded("STREAK_REFRESH_MINUTE", "5", 59)?,
        })
    }

    /// Current calendar day in the configured time zone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

fn parse_bounded(name: &'static str, default: &str, max: u32) -> Result<u32, ConfigError> {
    let parsed: u32 = parse_var(name, default)?;
    if parsed > max {
        return Err(ConfigError::Invalid {
            name,
            value: parsed.to_string(),
        });
    }
    Ok(parsed)
}

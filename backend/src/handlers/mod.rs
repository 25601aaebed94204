use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use shared::ApiError;
use uuid::Uuid;

pub mod activities;
pub mod challenges;
pub mod leaderboards;
pub mod members;
pub mod statistics;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(members::configure)
            .configure(activities::configure)
            .configure(challenges::configure)
            .configure(leaderboards::configure)
            .configure(statistics::configure),
    );
}

pub(crate) fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiError {
        error: "unauthorized".to_string(),
        message: "Invalid or missing token".to_string(),
    })
}

pub(crate) fn validation_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: "validation_error".to_string(),
        message: message.into(),
    })
}

pub(crate) fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiError {
        error: "not_found".to_string(),
        message: message.to_string(),
    })
}

pub(crate) fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiError {
        error: "internal_error".to_string(),
        message: message.to_string(),
    })
}

/// Parse an id from the path, answering 400 when it is not a UUID
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_id".to_string(),
            message: format!("Invalid {} ID format", what),
        })
    })
}

/// Parse a `YYYY-MM-DD` query value, answering 400 otherwise
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, HttpResponse> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_date".to_string(),
            message: "Dates must use the YYYY-MM-DD format".to_string(),
        })
    })
}

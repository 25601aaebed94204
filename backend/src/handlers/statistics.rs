use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use shared::ApiSuccess;

use super::{internal_error, parse_date, unauthorized};
use crate::models::AppState;
use crate::services::statistics::{self as statistics_service, StatisticsError};

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub date: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/statistics")
            .route("/breakdown", web::get().to(get_breakdown))
            .route("/today", web::get().to(get_active_today))
            .route("/calendar", web::get().to(get_calendar_day)),
    );
}

fn statistics_error(e: StatisticsError) -> HttpResponse {
    log::error!("Error fetching statistics: {:?}", e);
    internal_error("Failed to fetch statistics")
}

/// Distance per activity type for the family and each member
async fn get_breakdown(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match statistics_service::get_activity_breakdown(&state.db, &user_id).await {
        Ok(breakdown) => Ok(HttpResponse::Ok().json(ApiSuccess::new(breakdown))),
        Err(e) => Ok(statistics_error(e)),
    }
}

/// Members whose last activity is today
async fn get_active_today(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match statistics_service::get_active_today(&state.db, &user_id).await {
        Ok(members) => Ok(HttpResponse::Ok().json(ApiSuccess::new(members))),
        Err(e) => Ok(statistics_error(e)),
    }
}

/// One calendar day; defaults to today
async fn get_calendar_day(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let date = match query.date.as_deref() {
        Some(raw) => match parse_date(raw) {
            Ok(date) => date,
            Err(resp) => return Ok(resp),
        },
        None => state.config.today(),
    };

    match statistics_service::get_day_summary(&state.db, &user_id, date).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiSuccess::new(summary))),
        Err(e) => Ok(statistics_error(e)),
    }
}

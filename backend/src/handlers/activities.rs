use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use shared::{ApiSuccess, CreateActivityRequest, UpdateActivityRequest};

use super::{internal_error, not_found, parse_date, parse_id, unauthorized, validation_error};
use crate::models::AppState;
use crate::services::activity_logs::{self as activity_service, ActivityFilter, ActivityLogError};
use crate::services::streaks::StreakError;

#[derive(Debug, Deserialize)]
pub struct ListActivitiesQuery {
    pub date: Option<String>,
    pub family_member_id: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/activities")
            .route("", web::get().to(list_activities))
            .route("", web::post().to(log_activity))
            .route("/{id}", web::get().to(get_activity))
            .route("/{id}", web::put().to(update_activity)),
    );
}

fn activity_error(e: ActivityLogError) -> HttpResponse {
    match e {
        ActivityLogError::NotFound => not_found("Activity not found"),
        ActivityLogError::MemberNotFound | ActivityLogError::Streak(StreakError::MemberNotFound) => {
            not_found("Family member not found")
        }
        ActivityLogError::Validation(message) => validation_error(message),
        ActivityLogError::Streak(_) | ActivityLogError::DatabaseError(_) => {
            log::error!("Error processing activity: {:?}", e);
            internal_error("Failed to process activity")
        }
    }
}

/// List the account's activities, optionally for one day and/or one member
async fn list_activities(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    query: web::Query<ListActivitiesQuery>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let mut filter = ActivityFilter::default();
    if let Some(ref raw) = query.date {
        filter.date = match parse_date(raw) {
            Ok(date) => Some(date),
            Err(resp) => return Ok(resp),
        };
    }
    if let Some(ref raw) = query.family_member_id {
        filter.family_member_id = match parse_id(raw, "family member") {
            Ok(id) => Some(id),
            Err(resp) => return Ok(resp),
        };
    }

    match activity_service::list_activities(&state.db, &user_id, &filter).await {
        Ok(activities) => Ok(HttpResponse::Ok().json(ApiSuccess::new(activities))),
        Err(e) => Ok(activity_error(e)),
    }
}

async fn log_activity(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<CreateActivityRequest>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match activity_service::log_activity(
        &state.db,
        &state.member_locks,
        &user_id,
        &body.into_inner(),
        state.config.today(),
    )
    .await
    {
        Ok(logged) => Ok(HttpResponse::Created().json(ApiSuccess::new(logged))),
        Err(e) => Ok(activity_error(e)),
    }
}

async fn get_activity(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let activity_id = match parse_id(&path.into_inner(), "activity") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match activity_service::get_activity(&state.db, &user_id, &activity_id).await {
        Ok(Some(activity)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(activity))),
        Ok(None) => Ok(not_found("Activity not found")),
        Err(e) => Ok(activity_error(e)),
    }
}

async fn update_activity(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateActivityRequest>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let activity_id = match parse_id(&path.into_inner(), "activity") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match activity_service::update_activity(
        &state.db,
        &state.member_locks,
        &user_id,
        &activity_id,
        &body.into_inner(),
        state.config.today(),
    )
    .await
    {
        Ok(logged) => Ok(HttpResponse::Ok().json(ApiSuccess::new(logged))),
        Err(e) => Ok(activity_error(e)),
    }
}

use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use shared::{ApiSuccess, CreateFamilyMemberRequest, UpdateFamilyMemberRequest};

use super::{internal_error, not_found, parse_id, unauthorized, validation_error};
use crate::models::AppState;
use crate::services::family_members::{self as member_service, FamilyMemberError};
use crate::services::streaks::{self as streak_service, StreakError};

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub members_rebuilt: usize,
    pub members_failed: usize,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/members")
            .route("", web::get().to(list_members))
            .route("", web::post().to(create_member))
            .route("/streaks/rebuild", web::post().to(rebuild_streaks))
            .route("/{id}", web::get().to(get_member))
            .route("/{id}", web::put().to(update_member))
            .route("/{id}/streak", web::get().to(get_streak))
            .route("/{id}/streak", web::post().to(recalculate_streak)),
    );
}

fn member_error(e: FamilyMemberError, action: &str) -> HttpResponse {
    match e {
        FamilyMemberError::NotFound => not_found("Family member not found"),
        FamilyMemberError::Validation(message) => validation_error(message),
        FamilyMemberError::DatabaseError(_) => {
            log::error!("Error {} family member: {:?}", action, e);
            internal_error("Failed to process family member")
        }
    }
}

fn streak_error(e: StreakError) -> HttpResponse {
    match e {
        StreakError::MemberNotFound => not_found("Family member not found"),
        StreakError::DatabaseError(_) => {
            log::error!("Error recalculating streak: {:?}", e);
            internal_error("Failed to recalculate streak")
        }
    }
}

async fn list_members(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match member_service::list_members(&state.db, &user_id).await {
        Ok(members) => Ok(HttpResponse::Ok().json(ApiSuccess::new(members))),
        Err(e) => Ok(member_error(e, "listing")),
    }
}

async fn create_member(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<CreateFamilyMemberRequest>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match member_service::create_member(&state.db, &user_id, &body.into_inner()).await {
        Ok(member) => Ok(HttpResponse::Created().json(ApiSuccess::new(member))),
        Err(e) => Ok(member_error(e, "creating")),
    }
}

async fn get_member(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let member_id = match parse_id(&path.into_inner(), "family member") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match member_service::get_owned_member(&state.db, &user_id, &member_id).await {
        Ok(Some(member)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(member))),
        Ok(None) => Ok(not_found("Family member not found")),
        Err(e) => Ok(member_error(e, "fetching")),
    }
}

async fn update_member(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateFamilyMemberRequest>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let member_id = match parse_id(&path.into_inner(), "family member") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match member_service::update_member(&state.db, &user_id, &member_id, &body.into_inner()).await
    {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiSuccess::new(member))),
        Err(e) => Ok(member_error(e, "updating")),
    }
}

/// Current and longest streak computed from the full history, without touching the cache
async fn get_streak(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let member_id = match parse_id(&path.into_inner(), "family member") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match member_service::get_owned_member(&state.db, &user_id, &member_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found("Family member not found")),
        Err(e) => return Ok(member_error(e, "fetching")),
    }

    match streak_service::member_streak(&state.db, &member_id, state.config.today()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(e) => Ok(streak_error(e)),
    }
}

/// Re-derive and store the member's cached streak fields
async fn recalculate_streak(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let member_id = match parse_id(&path.into_inner(), "family member") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match member_service::get_owned_member(&state.db, &user_id, &member_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(not_found("Family member not found")),
        Err(e) => return Ok(member_error(e, "fetching")),
    }

    match streak_service::recalculate_member_streak(
        &state.db,
        &state.member_locks,
        &member_id,
        state.config.today(),
    )
    .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(e) => Ok(streak_error(e)),
    }
}

async fn rebuild_streaks(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match streak_service::rebuild_owner_streaks(
        &state.db,
        &state.member_locks,
        &user_id,
        state.config.today(),
    )
    .await
    {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiSuccess::new(RebuildResponse {
            members_rebuilt: report.members_rebuilt,
            members_failed: report.members_failed,
        }))),
        Err(e) => Ok(streak_error(e)),
    }
}

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use shared::{ActivityType, ApiError, ApiSuccess, LeaderboardScope};

use super::{internal_error, unauthorized};
use crate::models::AppState;
use crate::services::leaderboards::{self as leaderboard_service, LeaderboardError};

#[derive(Debug, Deserialize)]
pub struct ActivityLeaderboardQuery {
    #[serde(default)]
    pub scope: LeaderboardScope,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leaderboards")
            .route("/distance", web::get().to(distance_leaderboard))
            .route("/streaks", web::get().to(streak_leaderboard))
            .route("/activity/{activity_type}", web::get().to(activity_leaderboard)),
    );
}

fn leaderboard_error(e: LeaderboardError) -> HttpResponse {
    log::error!("Error building leaderboard: {:?}", e);
    internal_error("Failed to build leaderboard")
}

async fn distance_leaderboard(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match leaderboard_service::get_distance_leaderboard(&state.db, &user_id).await {
        Ok(entries) => Ok(HttpResponse::Ok().json(ApiSuccess::new(entries))),
        Err(e) => Ok(leaderboard_error(e)),
    }
}

async fn streak_leaderboard(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match leaderboard_service::get_streak_leaderboard(&state.db, &user_id, state.config.today())
        .await
    {
        Ok(entries) => Ok(HttpResponse::Ok().json(ApiSuccess::new(entries))),
        Err(e) => Ok(leaderboard_error(e)),
    }
}

async fn activity_leaderboard(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
    query: web::Query<ActivityLeaderboardQuery>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let raw_type = path.into_inner();
    let activity_type: ActivityType = match raw_type.parse() {
        Ok(activity_type) => activity_type,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "validation_error".to_string(),
                message: format!("Unknown activity type: {}", raw_type),
            }));
        }
    };

    match leaderboard_service::get_activity_leaderboard(
        &state.db,
        &user_id,
        activity_type,
        query.scope,
        state.config.today(),
    )
    .await
    {
        Ok(entries) => Ok(HttpResponse::Ok().json(ApiSuccess::new(entries))),
        Err(e) => Ok(leaderboard_error(e)),
    }
}

use actix_web::{web, HttpResponse, Result};
use shared::{ApiSuccess, CreateChallengeRequest};

use super::{internal_error, not_found, parse_id, unauthorized, validation_error};
use crate::models::AppState;
use crate::services::challenges::{self as challenge_service, ChallengeError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/challenges")
            .route("", web::get().to(list_challenges))
            .route("", web::post().to(create_challenge))
            .route("/{id}/progress", web::get().to(get_progress)),
    );
}

fn challenge_error(e: ChallengeError) -> HttpResponse {
    match e {
        ChallengeError::NotFound => not_found("Challenge not found"),
        ChallengeError::Validation(message) => validation_error(message),
        ChallengeError::DatabaseError(_) => {
            log::error!("Error processing challenge: {:?}", e);
            internal_error("Failed to process challenge")
        }
    }
}

async fn list_challenges(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match challenge_service::list_challenges(&state.db, &user_id).await {
        Ok(challenges) => Ok(HttpResponse::Ok().json(ApiSuccess::new(challenges))),
        Err(e) => Ok(challenge_error(e)),
    }
}

async fn create_challenge(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<CreateChallengeRequest>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    match challenge_service::create_challenge(
        &state.db,
        &user_id,
        &body.into_inner(),
        state.config.today(),
    )
    .await
    {
        Ok(challenge) => Ok(HttpResponse::Created().json(ApiSuccess::new(challenge))),
        Err(e) => Ok(challenge_error(e)),
    }
}

async fn get_progress(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(&req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => return Ok(unauthorized()),
    };

    let challenge_id = match parse_id(&path.into_inner(), "challenge") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match challenge_service::get_challenge_progress(
        &state.db,
        &user_id,
        &challenge_id,
        state.config.today(),
    )
    .await
    {
        Ok(progress) => Ok(HttpResponse::Ok().json(ApiSuccess::new(progress))),
        Err(e) => Ok(challenge_error(e)),
    }
}

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

mod config;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_utils;

use config::Config;
use services::background_jobs::{self, JobConfig};
use services::member_locks::MemberLocks;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    log::info!(
        "Starting server at {}:{} (calendar days in {})",
        config.host,
        config.port,
        config.timezone
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to create database pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    log::info!("Database migrations completed");

    let member_locks = Arc::new(MemberLocks::new());

    // Nightly refresh so cached labels roll over to "Yesterday"
    let pool_for_scheduler = Arc::new(pool.clone());
    let locks_for_scheduler = member_locks.clone();
    let job_config = JobConfig {
        refresh_hour: config.streak_refresh_hour,
        refresh_minute: config.streak_refresh_minute,
    };
    let timezone = config.timezone;
    tokio::spawn(async move {
        background_jobs::start_scheduler(pool_for_scheduler, locks_for_scheduler, timezone, job_config)
            .await;
    });

    let app_state = web::Data::new(models::AppState {
        db: pool,
        config: config.clone(),
        member_locks,
    });

    let allowed_origins = config.cors_origins.clone();

    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .iter()
                    .any(|allowed| origin_str.starts_with(allowed))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

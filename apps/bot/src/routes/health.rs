use actix_web::{web, HttpResponse};
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::state::app_state::AppState;

pub async fn root() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().body("Hello from cafebot! ☕"))
}

async fn health() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().body("ok"))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    app_version: &'static str,
    dry_run: bool,
    sessions: usize,
    time: String,
}

async fn status(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let time = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    Ok(HttpResponse::Ok().json(StatusResponse {
        status: "ok",
        app_version: env!("CARGO_PKG_VERSION"),
        dry_run: app_state.config.dry_run,
        sessions: app_state.games.session_count(),
        time,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health))
        .route("/health/status", web::get().to(status));
}

//! Health check endpoints.
//!
//! - `/health` — liveness. Always 200 while the process is responsive.
//! - `/health/db` — checks the screening database specifically.
//! - `/health/ready` — readiness: currently just the database. Provider
//!   reachability isn't load-bearing here since the router already retries
//!   and circuit-breaks around individual provider outages.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is alive", body = Object)),
    tag = "health"
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "investigation-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[utoipa::path(
    get,
    path = "/health/db",
    responses(
        (status = 200, description = "Database reachable", body = Object),
        (status = 503, description = "Database unreachable", body = Object)
    ),
    tag = "health"
)]
pub async fn db_health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = check_db(&state).await;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(json!({ "database": healthy })))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = Object),
        (status = 503, description = "Service is not ready", body = Object)
    ),
    tag = "health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = check_db(&state).await;
    let is_ready = db_healthy;

    let status = if is_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "ready": is_ready,
            "checks": {
                "database": db_healthy,
            }
        })),
    )
}

async fn check_db(state: &AppState) -> bool {
    match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => true,
        Err(err) => {
            error!("Database health check failed: {}", err);
            false
        }
    }
}

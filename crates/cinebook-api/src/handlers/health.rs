//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let (lock_store, database) = tokio::join!(
        state.lock_store.health_check(),
        state.store.health_check()
    );
    let lock_store = lock_store.unwrap_or(false);
    let database = database.unwrap_or(false);
    let healthy = lock_store && database;

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        lock_store,
        database,
        payment_breakers: state.payments.breakers(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ApiResponse::ok(body)))
}

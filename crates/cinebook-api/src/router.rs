//! Route definitions for the Cinebook HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to every handler via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(seat_routes(&state))
        .merge(confirm_routes(&state))
        .merge(booking_routes())
        .merge(admin_routes())
        .merge(health_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);
    let timeout = state.config.server.request_timeout();

    Router::new()
        .nest("/api", api_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Seat lock endpoints, rate limited per caller
fn seat_routes(state: &AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/bookings/lock", post(handlers::seat::lock_seat))
        .route("/bookings/lock-multiple", post(handlers::seat::lock_seats))
        .route("/bookings/unlock", post(handlers::seat::unlock_seats))
        .route("/bookings/lock/extend", post(handlers::seat::extend_lock))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::seat_lock_limit,
        ));

    limited.route(
        "/bookings/lock/{show_id}/{seat_id}",
        get(handlers::seat::lock_status),
    )
}

/// Confirmation: rate limited, then idempotent
fn confirm_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings/confirm", post(handlers::booking::confirm))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::idempotency::idempotency,
        ))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::booking_limit,
        ))
}

/// Cancellation and the caller's own bookings
fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings/me", get(handlers::booking::my_bookings))
        .route("/bookings/me/history", get(handlers::booking::my_history))
        .route("/bookings/{id}", get(handlers::booking::get_booking))
        .route("/bookings/{id}/cancel", post(handlers::booking::cancel))
}

/// Admin views
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/bookings", get(handlers::admin::list_bookings))
        .route("/admin/bookings/stats", get(handlers::admin::stats))
        .route(
            "/admin/shows/{show_id}/bookings",
            get(handlers::admin::show_bookings),
        )
        .route("/admin/refunds", get(handlers::admin::refunds))
}

/// Health check (public)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

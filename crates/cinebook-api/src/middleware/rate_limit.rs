//! Per-caller fixed-window rate limits for seat locking and confirmation.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use cinebook_core::error::AppError;
use cinebook_service::RateLimitDecision;

use crate::error::ApiError;
use crate::extractors::auth::authenticate;
use crate::state::AppState;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Limits seat lock and unlock calls per caller.
pub async fn seat_lock_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let caller = caller_key(&state, request.headers());
    let decision = state.rate_limiter.check_seat_lock(&caller).await;
    enforce(decision, request, next).await
}

/// Limits booking confirmations per caller.
pub async fn booking_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let caller = caller_key(&state, request.headers());
    let decision = state.rate_limiter.check_booking(&caller).await;
    enforce(decision, request, next).await
}

/// The user id when the token is valid, otherwise the client address.
fn caller_key(state: &AppState, headers: &HeaderMap) -> String {
    if let Ok(claims) = authenticate(state, headers) {
        return claims.sub.to_string();
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| format!("ip:{}", ip.trim()))
        .unwrap_or_else(|| "anonymous".to_string())
}

async fn enforce(decision: RateLimitDecision, request: Request, next: Next) -> Response {
    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            limit = decision.limit,
            reset_after = decision.reset_after_seconds,
            "Rate limit exceeded"
        );
        let mut response = ApiError(
            AppError::rate_limited("Too many requests, please slow down").with_details(
                serde_json::json!({ "retry_after_seconds": decision.reset_after_seconds }),
            ),
        )
        .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(decision.reset_after_seconds));
        response
    };

    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(decision.limit));
    headers.insert(
        HeaderName::from_static(REMAINING_HEADER),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static(RESET_HEADER),
        HeaderValue::from(decision.reset_after_seconds),
    );
    response
}

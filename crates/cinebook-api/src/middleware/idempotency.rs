//! Replays stored confirmation responses for repeated `Idempotency-Key`s.
//!
//! Only completed responses below 500 are stored. A second request arriving
//! while the first is still running gets 409 instead of charging twice.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use cinebook_core::error::AppError;
use cinebook_service::{IdempotencyGuard, IdempotencyStart, StoredResponse};

use crate::error::ApiError;
use crate::extractors::auth::authenticate;
use crate::state::AppState;

/// Request header carrying the client's key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
/// Response header set on replays.
pub const REPLAYED_HEADER: &str = "idempotent-replayed";

/// Responses are buffered before storing; confirmation bodies are small.
const MAX_STORED_BODY: usize = 1024 * 1024;

pub async fn idempotency(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(raw_key) = request.headers().get(IDEMPOTENCY_KEY_HEADER) else {
        return next.run(request).await;
    };
    let raw_key = match raw_key.to_str() {
        Ok(key) => key.to_string(),
        Err(_) => {
            return ApiError(AppError::validation("Idempotency-Key must be visible ASCII"))
                .into_response();
        }
    };

    // Unauthenticated requests fall through; the handler rejects them.
    let Ok(claims) = authenticate(&state, request.headers()) else {
        return next.run(request).await;
    };

    let key = match IdempotencyGuard::scoped_key(claims.sub, &raw_key) {
        Ok(key) => key,
        Err(e) => return ApiError(e).into_response(),
    };

    match state.idempotency.begin(&key).await {
        Ok(IdempotencyStart::Replay(stored)) => {
            tracing::info!(key = %raw_key, status = stored.status, "Replaying stored response");
            replay(stored)
        }
        Ok(IdempotencyStart::InFlight) => ApiError(AppError::conflict(
            "A request with this Idempotency-Key is already in progress",
        ))
        .into_response(),
        Ok(IdempotencyStart::Proceed) => {
            let response = next.run(request).await;
            store_response(&state.idempotency, &key, response).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Idempotency store unavailable");
            ApiError(AppError::service_unavailable(
                "Idempotency store unavailable, please retry",
            ))
            .into_response()
        }
    }
}

fn replay(stored: StoredResponse) -> Response {
    let status = StatusCode::from_u16(stored.status).unwrap_or(StatusCode::OK);
    let mut response = (status, stored.body).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(REPLAYED_HEADER, HeaderValue::from_static("true"));
    response
}

async fn store_response(guard: &IdempotencyGuard, key: &str, response: Response) -> Response {
    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_STORED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Response body too large to store; not idempotent");
            if let Err(e) = guard.release(key).await {
                tracing::warn!(error = %e, "Failed to release idempotency marker");
            }
            return ApiError(AppError::internal("Failed to read response body")).into_response();
        }
    };

    let stored = StoredResponse {
        status: parts.status.as_u16(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };
    if let Err(e) = guard.complete(key, &stored).await {
        tracing::warn!(error = %e, "Failed to store idempotent response");
    }

    Response::from_parts(parts, Body::from(bytes))
}

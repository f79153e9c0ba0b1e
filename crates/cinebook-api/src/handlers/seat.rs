//! Seat lock handlers.

use axum::Json;
use axum::extract::{Path, State};

use cinebook_core::error::AppError;
use cinebook_core::types::id::ShowId;
use cinebook_service::LockOutcome;

use crate::dto::request::{ExtendLockRequest, LockSeatRequest, SeatsRequest};
use crate::dto::response::{ApiResponse, MessageResponse, SeatLockResponse};
use crate::error::ApiError;
use crate::extractors::path::parse_id;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/bookings/lock
pub async fn lock_seat(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<LockSeatRequest>,
) -> Result<Json<ApiResponse<SeatLockResponse>>, ApiError> {
    let locked = state
        .seat_locks
        .lock_seat(req.show_id, &req.seat_id, auth.user_id)
        .await?;

    if !locked {
        return Err(AppError::conflict(format!(
            "Seat {} is already locked by another user",
            req.seat_id
        ))
        .with_details(serde_json::json!({ "seat_id": req.seat_id }))
        .into());
    }

    Ok(Json(ApiResponse::ok(SeatLockResponse {
        show_id: req.show_id,
        seat_id: req.seat_id,
        locked: true,
        ttl_seconds: state.seat_locks.lock_ttl().as_secs() as i64,
    })))
}

/// POST /api/bookings/lock-multiple
pub async fn lock_seats(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SeatsRequest>,
) -> Result<Json<ApiResponse<LockOutcome>>, ApiError> {
    let outcome = state
        .seat_locks
        .lock_seats(req.show_id, &req.seat_ids, auth.user_id)
        .await?;

    if !outcome.is_complete() {
        return Err(AppError::conflict("Some seats are unavailable")
            .with_details(serde_json::json!({ "failed": outcome.failed }))
            .into());
    }

    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/bookings/unlock
pub async fn unlock_seats(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SeatsRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .seat_locks
        .unlock_many(req.show_id, &req.seat_ids)
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Seats unlocked".to_string(),
    })))
}

/// POST /api/bookings/lock/extend
pub async fn extend_lock(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ExtendLockRequest>,
) -> Result<Json<ApiResponse<SeatLockResponse>>, ApiError> {
    let extended = state
        .seat_locks
        .extend(req.show_id, &req.seat_id, req.ttl_seconds)
        .await?;

    if !extended {
        return Err(AppError::not_found(format!(
            "No lock on seat {}; it may have expired",
            req.seat_id
        ))
        .into());
    }

    let status = state.seat_locks.status(req.show_id, &req.seat_id).await?;
    Ok(Json(ApiResponse::ok(SeatLockResponse {
        show_id: req.show_id,
        seat_id: req.seat_id,
        locked: status.is_locked,
        ttl_seconds: status.ttl_seconds,
    })))
}

/// GET /api/bookings/lock/{show_id}/{seat_id}
pub async fn lock_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((show_id, seat_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<SeatLockResponse>>, ApiError> {
    let show_id: ShowId = parse_id(&show_id, "show id")?;
    let status = state.seat_locks.status(show_id, &seat_id).await?;

    Ok(Json(ApiResponse::ok(SeatLockResponse {
        show_id,
        seat_id,
        locked: status.is_locked,
        ttl_seconds: status.ttl_seconds,
    })))
}

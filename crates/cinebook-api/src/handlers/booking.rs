//! Booking confirmation, cancellation, and lookup handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use cinebook_core::types::id::BookingId;
use cinebook_entity::booking::Booking;
use cinebook_entity::user::HistoryEntry;

use crate::dto::request::{CancelRequest, ConfirmRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::path::parse_id;
use crate::extractors::{AuthUser, ValidatedJson, parse_optional};
use crate::state::AppState;

/// POST /api/bookings/confirm
pub async fn confirm(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ConfirmRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), ApiError> {
    let booking = state.bookings.confirm(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(booking))))
}

/// POST /api/bookings/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let id: BookingId = parse_id(&id, "booking id")?;
    let req: CancelRequest = parse_optional(&body)?;
    let booking = state.bookings.cancel(&auth, id, req.into()).await?;
    Ok(Json(ApiResponse::ok(booking)))
}

/// GET /api/bookings/me
pub async fn my_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Booking>>>, ApiError> {
    let bookings = state.queries.my_bookings(&auth).await?;
    Ok(Json(ApiResponse::ok(bookings)))
}

/// GET /api/bookings/me/history
pub async fn my_history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let history = state.queries.my_history(&auth).await?;
    Ok(Json(ApiResponse::ok(history)))
}

/// GET /api/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, ApiError> {
    let id: BookingId = parse_id(&id, "booking id")?;
    let booking = state.queries.get_booking(&auth, id).await?;
    Ok(Json(ApiResponse::ok(booking)))
}

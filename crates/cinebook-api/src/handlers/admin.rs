//! Admin views over bookings and the refund queue.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};

use cinebook_core::error::AppError;
use cinebook_core::types::id::ShowId;
use cinebook_core::types::pagination::PageResponse;
use cinebook_entity::booking::{Booking, BookingStats};
use cinebook_service::booking::ShowBookings;

use crate::dto::response::{ApiResponse, RefundQueueResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::extractors::path::parse_id;
use crate::extractors::query::BookingListParams;
use crate::state::AppState;

/// GET /api/admin/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    params: Result<Query<BookingListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<PageResponse<Booking>>>, ApiError> {
    let Query(params) = params.map_err(|e| AppError::validation(e.body_text()))?;
    let (filter, page) = params.into_parts();
    let listing = state.queries.list_bookings(&auth, filter, page).await?;
    Ok(Json(ApiResponse::ok(listing)))
}

/// GET /api/admin/bookings/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<BookingStats>>, ApiError> {
    let stats = state.queries.stats(&auth).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/admin/shows/{show_id}/bookings
pub async fn show_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(show_id): Path<String>,
) -> Result<Json<ApiResponse<ShowBookings>>, ApiError> {
    let show_id: ShowId = parse_id(&show_id, "show id")?;
    let listing = state.queries.bookings_by_show(&auth, show_id).await?;
    Ok(Json(ApiResponse::ok(listing)))
}

/// GET /api/admin/refunds
pub async fn refunds(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<RefundQueueResponse>>, ApiError> {
    auth.require_admin()?;
    let pending = state.refunds.pending().await?;
    let exhausted = state.refunds.exhausted().await?;
    Ok(Json(ApiResponse::ok(RefundQueueResponse { pending, exhausted })))
}

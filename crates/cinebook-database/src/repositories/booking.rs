//! Booking repository implementation (reads and admin queries).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cinebook_core::error::{AppError, ErrorKind};
use cinebook_core::result::AppResult;
use cinebook_core::types::id::{BookingId, ShowId, UserId};
use cinebook_core::types::pagination::{PageRequest, PageResponse};
use cinebook_entity::booking::{Booking, BookingFilter, BookingStats};
use cinebook_entity::user::HistoryEntry;

/// Filter clause shared by the admin count and page queries.
const FILTER_CLAUSE: &str = "($1::booking_status IS NULL OR status = $1) \
     AND ($2::uuid IS NULL OR show_id = $2) \
     AND ($3::uuid IS NULL OR user_id = $3) \
     AND ($4::timestamptz IS NULL OR created_at >= $4) \
     AND ($5::timestamptz IS NULL OR created_at <= $5)";

/// Repository for booking queries outside the commit transaction.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a booking by ID.
    pub async fn find_by_id(&self, id: BookingId) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find booking", e))
    }

    /// All bookings of a user, newest first.
    pub async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user bookings", e))
    }

    /// Non-cancelled bookings of a show, newest first.
    pub async fn find_active_by_show(&self, show_id: ShowId) -> AppResult<Vec<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE show_id = $1 AND status <> 'CANCELLED' \
             ORDER BY created_at DESC",
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list show bookings", e))
    }

    /// Number of pending or confirmed bookings for a show.
    pub async fn count_active(&self, show_id: ShowId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE show_id = $1 \
             AND status IN ('PENDING', 'CONFIRMED')",
        )
        .bind(show_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count bookings", e))
    }

    /// Filtered listing with pagination.
    pub async fn find_all(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM bookings WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.status)
        .bind(filter.show_id)
        .bind(filter.user_id)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count bookings", e))?;

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT * FROM bookings WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC LIMIT $6 OFFSET $7"
        ))
        .bind(filter.status)
        .bind(filter.show_id)
        .bind(filter.user_id)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list bookings", e))?;

        Ok(PageResponse::new(
            bookings,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Aggregate counters for the admin dashboard.
    pub async fn stats(&self, today_since: DateTime<Utc>) -> AppResult<BookingStats> {
        sqlx::query_as::<_, BookingStats>(
            "SELECT \
                COUNT(*) AS total_bookings, \
                COUNT(*) FILTER (WHERE status = 'CONFIRMED') AS confirmed_bookings, \
                COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled_bookings, \
                COALESCE(SUM(total_amount) FILTER (WHERE status = 'CONFIRMED'), 0)::BIGINT \
                    AS total_revenue, \
                COUNT(*) FILTER (WHERE created_at >= $1) AS today_bookings \
             FROM bookings",
        )
        .bind(today_since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute booking stats", e))
    }

    /// A user's booking history, oldest first.
    pub async fn find_history(&self, user_id: UserId) -> AppResult<Vec<HistoryEntry>> {
        sqlx::query_as::<_, HistoryEntry>(
            "SELECT * FROM user_booking_history WHERE user_id = $1 ORDER BY booked_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load history", e))
    }

    /// Store the gateway refund id on a booking.
    pub async fn set_refund_id(&self, id: BookingId, refund_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET refund_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(refund_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record refund", e))?;
        Ok(result.rows_affected() > 0)
    }
}

//! PostgreSQL booking store and its transaction type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use cinebook_core::error::{AppError, ErrorKind};
use cinebook_core::result::AppResult;
use cinebook_core::types::id::{BookingId, HallId, ShowId, UserId};
use cinebook_core::types::pagination::{PageRequest, PageResponse};
use cinebook_entity::booking::{Booking, BookingFilter, BookingStats};
use cinebook_entity::hall::Hall;
use cinebook_entity::show::Show;
use cinebook_entity::user::HistoryEntry;

use crate::store::{BookingStore, BookingTransaction};

use super::booking::BookingRepository;
use super::show::ShowRepository;

/// [`BookingStore`] on PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: PgPool,
    shows: ShowRepository,
    bookings: BookingRepository,
}

impl PgBookingStore {
    /// Create a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            shows: ShowRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            pool,
        }
    }

    /// Show and hall repository, for seeding.
    pub fn shows(&self) -> &ShowRepository {
        &self.shows
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> AppResult<Box<dyn BookingTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;
        Ok(Box::new(PgBookingTransaction { tx }))
    }

    async fn find_show(&self, id: ShowId) -> AppResult<Option<Show>> {
        self.shows.find_by_id(id).await
    }

    async fn find_hall(&self, id: HallId) -> AppResult<Option<Hall>> {
        self.shows.find_hall(id).await
    }

    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        self.bookings.find_by_id(id).await
    }

    async fn find_bookings_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        self.bookings.find_by_user(user_id).await
    }

    async fn find_active_bookings_by_show(&self, show_id: ShowId) -> AppResult<Vec<Booking>> {
        self.bookings.find_active_by_show(show_id).await
    }

    async fn count_active_bookings(&self, show_id: ShowId) -> AppResult<i64> {
        self.bookings.count_active(show_id).await
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        self.bookings.find_all(filter, page).await
    }

    async fn booking_stats(&self, today_since: DateTime<Utc>) -> AppResult<BookingStats> {
        self.bookings.stats(today_since).await
    }

    async fn find_history(&self, user_id: UserId) -> AppResult<Vec<HistoryEntry>> {
        self.bookings.find_history(user_id).await
    }

    async fn record_refund(&self, booking_id: BookingId, refund_id: &str) -> AppResult<bool> {
        self.bookings.set_refund_id(booking_id, refund_id).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}

/// An open PostgreSQL transaction. Dropped without commit, sqlx rolls it back.
pub struct PgBookingTransaction {
    tx: Transaction<'static, Postgres>,
}

fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

#[async_trait]
impl BookingTransaction for PgBookingTransaction {
    async fn show_for_update(&mut self, id: ShowId) -> AppResult<Option<Show>> {
        sqlx::query_as::<_, Show>("SELECT * FROM shows WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err("Failed to lock show"))
    }

    async fn booking_for_update(
        &mut self,
        id: BookingId,
        user_id: UserId,
    ) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("Failed to lock booking"))
    }

    async fn insert_booking(&mut self, booking: &Booking) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO bookings (id, user_id, show_id, seats, total_amount, status, payment_id, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.show_id)
        .bind(&booking.seats)
        .bind(booking.total_amount)
        .bind(booking.status)
        .bind(&booking.payment_id)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to insert booking"))?;
        Ok(())
    }

    async fn update_cancellation(&mut self, booking: &Booking) -> AppResult<()> {
        sqlx::query(
            "UPDATE bookings SET status = $2, cancelled_at = $3, cancellation_reason = $4, \
             refund_amount = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(booking.id)
        .bind(booking.status)
        .bind(booking.cancelled_at)
        .bind(&booking.cancellation_reason)
        .bind(booking.refund_amount)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to cancel booking"))?;
        Ok(())
    }

    async fn add_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()> {
        sqlx::query(
            "UPDATE shows SET booked_seats = booked_seats || $2::text[], updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(show_id)
        .bind(seats)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to append booked seats"))?;
        Ok(())
    }

    async fn remove_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()> {
        sqlx::query(
            "UPDATE shows SET booked_seats = ARRAY( \
                SELECT s FROM unnest(booked_seats) WITH ORDINALITY AS t(s, i) \
                WHERE NOT (s = ANY($2::text[])) ORDER BY i \
             ), updated_at = NOW() WHERE id = $1",
        )
        .bind(show_id)
        .bind(seats)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to release booked seats"))?;
        Ok(())
    }

    async fn push_history(&mut self, entry: &HistoryEntry) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_booking_history (user_id, booking_id, show_id, booked_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.user_id)
        .bind(entry.booking_id)
        .bind(entry.show_id)
        .bind(entry.booked_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("Failed to record booking history"))?;
        Ok(())
    }

    async fn pull_history(&mut self, user_id: UserId, booking_id: BookingId) -> AppResult<()> {
        sqlx::query("DELETE FROM user_booking_history WHERE user_id = $1 AND booking_id = $2")
            .bind(user_id)
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("Failed to remove booking history"))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(db_err("Failed to commit transaction"))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(db_err("Failed to roll back transaction"))
    }
}

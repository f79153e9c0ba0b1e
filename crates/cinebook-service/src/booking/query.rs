//! Read-side booking queries for customers and administrators.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cinebook_core::error::AppError;
use cinebook_core::types::id::{BookingId, ShowId};
use cinebook_core::types::pagination::{PageRequest, PageResponse};
use cinebook_database::BookingStore;
use cinebook_entity::booking::{Booking, BookingFilter, BookingStats};
use cinebook_entity::user::HistoryEntry;

use crate::context::RequestContext;

/// Non-cancelled bookings of a show with the active count.
#[derive(Debug, Clone, Serialize)]
pub struct ShowBookings {
    /// Show queried.
    pub show_id: ShowId,
    /// Bookings, newest first.
    pub bookings: Vec<Booking>,
    /// `PENDING` or `CONFIRMED` bookings.
    pub active_count: i64,
}

/// Booking lookups, listings, and statistics.
#[derive(Debug, Clone)]
pub struct BookingQueryService {
    /// Booking store.
    store: Arc<dyn BookingStore>,
}

impl BookingQueryService {
    /// Creates a new booking query service.
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Gets a booking (only its owner or an admin can view it).
    pub async fn get_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
    ) -> Result<Booking, AppError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking not found"))?;

        if !ctx.can_access(booking.user_id) {
            return Err(AppError::forbidden("You can only view your own bookings"));
        }
        Ok(booking)
    }

    /// Lists the caller's bookings, newest first.
    pub async fn my_bookings(&self, ctx: &RequestContext) -> Result<Vec<Booking>, AppError> {
        self.store.find_bookings_by_user(ctx.user_id).await
    }

    /// The caller's booking history, oldest first.
    pub async fn my_history(&self, ctx: &RequestContext) -> Result<Vec<HistoryEntry>, AppError> {
        self.store.find_history(ctx.user_id).await
    }

    /// Non-cancelled bookings of a show (admin only).
    pub async fn bookings_by_show(
        &self,
        ctx: &RequestContext,
        show_id: ShowId,
    ) -> Result<ShowBookings, AppError> {
        ctx.require_admin()?;
        let (bookings, active_count) = futures::try_join!(
            self.store.find_active_bookings_by_show(show_id),
            self.store.count_active_bookings(show_id),
        )?;
        Ok(ShowBookings {
            show_id,
            bookings,
            active_count,
        })
    }

    /// Number of `PENDING` or `CONFIRMED` bookings for a show.
    pub async fn active_count(&self, show_id: ShowId) -> Result<i64, AppError> {
        self.store.count_active_bookings(show_id).await
    }

    /// Filtered, paginated listing of all bookings (admin only).
    pub async fn list_bookings(
        &self,
        ctx: &RequestContext,
        filter: BookingFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        ctx.require_admin()?;
        if let (Some(from), Some(to)) = (filter.created_from, filter.created_to) {
            if from > to {
                return Err(AppError::validation("date_from must not be after date_to"));
            }
        }
        self.store.list_bookings(&filter, &page).await
    }

    /// Aggregate booking counters (admin only). "Today" starts at midnight UTC.
    pub async fn stats(&self, ctx: &RequestContext) -> Result<BookingStats, AppError> {
        ctx.require_admin()?;
        self.store.booking_stats(start_of_day(Utc::now())).await
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

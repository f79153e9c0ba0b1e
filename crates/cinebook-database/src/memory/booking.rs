//! In-memory booking store.
//!
//! A transaction takes the store-wide mutex and works on a staged copy of
//! the data; commit swaps the copy in, drop discards it. That gives
//! serializable isolation, which is what the seat re-check needs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use cinebook_core::result::AppResult;
use cinebook_core::types::id::{BookingId, HallId, ShowId, UserId};
use cinebook_core::types::pagination::{PageRequest, PageResponse};
use cinebook_entity::booking::{Booking, BookingFilter, BookingStats, BookingStatus};
use cinebook_entity::hall::Hall;
use cinebook_entity::show::Show;
use cinebook_entity::user::HistoryEntry;

use crate::store::{BookingStore, BookingTransaction};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    shows: HashMap<ShowId, Show>,
    halls: HashMap<HallId, Hall>,
    bookings: HashMap<BookingId, Booking>,
    history: Vec<HistoryEntry>,
}

/// [`BookingStore`] held entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookingStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBookingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a show.
    pub async fn insert_show(&self, show: Show) {
        self.state.lock().await.shows.insert(show.id, show);
    }

    /// Insert or replace a hall.
    pub async fn insert_hall(&self, hall: Hall) {
        self.state.lock().await.halls.insert(hall.id, hall);
    }

    /// Insert or replace a booking without touching the show.
    pub async fn insert_booking(&self, booking: Booking) {
        self.state.lock().await.bookings.insert(booking.id, booking);
    }
}

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bookings
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn begin(&self) -> AppResult<Box<dyn BookingTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryBookingTransaction { guard, staged }))
    }

    async fn find_show(&self, id: ShowId) -> AppResult<Option<Show>> {
        Ok(self.state.lock().await.shows.get(&id).cloned())
    }

    async fn find_hall(&self, id: HallId) -> AppResult<Option<Hall>> {
        Ok(self.state.lock().await.halls.get(&id).cloned())
    }

    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn find_bookings_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state
                .bookings
                .values()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_active_bookings_by_show(&self, show_id: ShowId) -> AppResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state
                .bookings
                .values()
                .filter(|b| b.show_id == show_id && !b.is_cancelled())
                .cloned()
                .collect(),
        ))
    }

    async fn count_active_bookings(&self, show_id: ShowId) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.show_id == show_id && b.status.is_active())
            .count() as i64)
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        let state = self.state.lock().await;
        let matching = newest_first(
            state
                .bookings
                .values()
                .filter(|b| filter.matches(b))
                .cloned()
                .collect(),
        );
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn booking_stats(&self, today_since: DateTime<Utc>) -> AppResult<BookingStats> {
        let state = self.state.lock().await;
        let mut stats = BookingStats::default();
        for booking in state.bookings.values() {
            stats.total_bookings += 1;
            match booking.status {
                BookingStatus::Confirmed => {
                    stats.confirmed_bookings += 1;
                    stats.total_revenue += booking.total_amount;
                }
                BookingStatus::Cancelled => stats.cancelled_bookings += 1,
                BookingStatus::Pending => {}
            }
            if booking.created_at >= today_since {
                stats.today_bookings += 1;
            }
        }
        Ok(stats)
    }

    async fn find_history(&self, user_id: UserId) -> AppResult<Vec<HistoryEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn record_refund(&self, booking_id: BookingId, refund_id: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.bookings.get_mut(&booking_id) {
            Some(booking) => {
                booking.refund_id = Some(refund_id.to_string());
                booking.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// Transaction over [`MemoryBookingStore`].
#[derive(Debug)]
pub struct MemoryBookingTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl BookingTransaction for MemoryBookingTransaction {
    async fn show_for_update(&mut self, id: ShowId) -> AppResult<Option<Show>> {
        Ok(self.staged.shows.get(&id).cloned())
    }

    async fn booking_for_update(
        &mut self,
        id: BookingId,
        user_id: UserId,
    ) -> AppResult<Option<Booking>> {
        Ok(self
            .staged
            .bookings
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> AppResult<()> {
        self.staged.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update_cancellation(&mut self, booking: &Booking) -> AppResult<()> {
        if let Some(existing) = self.staged.bookings.get_mut(&booking.id) {
            existing.status = booking.status;
            existing.cancelled_at = booking.cancelled_at;
            existing.cancellation_reason = booking.cancellation_reason.clone();
            existing.refund_amount = booking.refund_amount;
            existing.updated_at = booking.updated_at;
        }
        Ok(())
    }

    async fn add_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()> {
        if let Some(show) = self.staged.shows.get_mut(&show_id) {
            show.booked_seats.extend(seats.iter().cloned());
            show.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn remove_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()> {
        if let Some(show) = self.staged.shows.get_mut(&show_id) {
            show.booked_seats.retain(|s| !seats.contains(s));
            show.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn push_history(&mut self, entry: &HistoryEntry) -> AppResult<()> {
        self.staged.history.push(entry.clone());
        Ok(())
    }

    async fn pull_history(&mut self, user_id: UserId, booking_id: BookingId) -> AppResult<()> {
        self.staged
            .history
            .retain(|h| !(h.user_id == user_id && h.booking_id == booking_id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryBookingTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

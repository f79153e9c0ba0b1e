//! Store traits consumed by the booking services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cinebook_core::result::AppResult;
use cinebook_core::types::id::{BookingId, HallId, RefundEntryId, ShowId, UserId};
use cinebook_core::types::pagination::{PageRequest, PageResponse};
use cinebook_entity::booking::{Booking, BookingFilter, BookingStats};
use cinebook_entity::hall::Hall;
use cinebook_entity::refund::{CreateQueuedRefund, QueuedRefund};
use cinebook_entity::show::Show;
use cinebook_entity::user::HistoryEntry;

/// Shows, halls, bookings, and user history, with multi-row transactions.
///
/// A show's `booked_seats` only changes inside a [`BookingTransaction`].
#[async_trait]
pub trait BookingStore: Send + Sync + std::fmt::Debug + 'static {
    /// Open a transaction. Dropping it without `commit` rolls it back.
    async fn begin(&self) -> AppResult<Box<dyn BookingTransaction>>;

    /// Find a show by ID.
    async fn find_show(&self, id: ShowId) -> AppResult<Option<Show>>;

    /// Find a hall by ID.
    async fn find_hall(&self, id: HallId) -> AppResult<Option<Hall>>;

    /// Find a booking by ID.
    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>>;

    /// All bookings of a user, newest first.
    async fn find_bookings_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>>;

    /// Non-cancelled bookings of a show, newest first.
    async fn find_active_bookings_by_show(&self, show_id: ShowId) -> AppResult<Vec<Booking>>;

    /// Number of `PENDING` or `CONFIRMED` bookings for a show.
    async fn count_active_bookings(&self, show_id: ShowId) -> AppResult<i64>;

    /// Filtered, paginated listing, newest first.
    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>>;

    /// Aggregate counters; `today_since` bounds the "today" bucket.
    async fn booking_stats(&self, today_since: DateTime<Utc>) -> AppResult<BookingStats>;

    /// A user's booking history, oldest first.
    async fn find_history(&self, user_id: UserId) -> AppResult<Vec<HistoryEntry>>;

    /// Store the gateway refund id on a booking. Returns `false` if the
    /// booking does not exist.
    async fn record_refund(&self, booking_id: BookingId, refund_id: &str) -> AppResult<bool>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// One open transaction against the [`BookingStore`].
///
/// Reads through `*_for_update` lock the row until commit or rollback, so a
/// check made inside the transaction still holds when its writes land.
#[async_trait]
pub trait BookingTransaction: Send {
    /// Read a show and lock it for the rest of the transaction.
    async fn show_for_update(&mut self, id: ShowId) -> AppResult<Option<Show>>;

    /// Read a booking owned by `user_id` and lock it.
    async fn booking_for_update(
        &mut self,
        id: BookingId,
        user_id: UserId,
    ) -> AppResult<Option<Booking>>;

    /// Insert a new booking row.
    async fn insert_booking(&mut self, booking: &Booking) -> AppResult<()>;

    /// Persist the status and cancellation fields of a booking.
    async fn update_cancellation(&mut self, booking: &Booking) -> AppResult<()>;

    /// Append seats to a show's `booked_seats`.
    async fn add_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()>;

    /// Remove seats from a show's `booked_seats`.
    async fn remove_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()>;

    /// Append an entry to a user's history.
    async fn push_history(&mut self, entry: &HistoryEntry) -> AppResult<()>;

    /// Remove the history entry referencing a booking.
    async fn pull_history(&mut self, user_id: UserId, booking_id: BookingId) -> AppResult<()>;

    /// Make every write visible atomically.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discard every write.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Durable queue of refunds awaiting retry.
///
/// Delivery is at-least-once: an entry claimed by a sweep that dies is
/// reclaimed once its lease runs out.
#[async_trait]
pub trait RefundStore: Send + Sync + std::fmt::Debug + 'static {
    /// Queue a refund with zero attempts.
    async fn enqueue(&self, data: CreateQueuedRefund) -> AppResult<QueuedRefund>;

    /// Claim up to `limit` entries with `attempts < max_attempts` whose
    /// lease is free, leasing them for `lease_seconds`.
    async fn claim_due(
        &self,
        max_attempts: i32,
        lease_seconds: i64,
        limit: i64,
    ) -> AppResult<Vec<QueuedRefund>>;

    /// Delete an entry after a successful refund.
    async fn remove(&self, id: RefundEntryId) -> AppResult<()>;

    /// Count a failed attempt and release the lease.
    async fn record_failure(&self, id: RefundEntryId, error: &str) -> AppResult<()>;

    /// Release the lease without counting an attempt.
    async fn release(&self, id: RefundEntryId) -> AppResult<()>;

    /// Entries that still have attempts left.
    async fn find_pending(&self, max_attempts: i32) -> AppResult<Vec<QueuedRefund>>;

    /// Entries that used up their attempts.
    async fn find_exhausted(&self, max_attempts: i32) -> AppResult<Vec<QueuedRefund>>;

    /// Entries queued for a booking.
    async fn find_by_booking(&self, booking_id: BookingId) -> AppResult<Vec<QueuedRefund>>;
}

//! Booking history entries kept per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cinebook_core::types::id::{BookingId, ShowId, UserId};

/// One entry in a user's booking history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    /// Owner.
    pub user_id: UserId,
    /// Booking referenced.
    pub booking_id: BookingId,
    /// Show booked.
    pub show_id: ShowId,
    /// When the booking was committed.
    pub booked_at: DateTime<Utc>,
}

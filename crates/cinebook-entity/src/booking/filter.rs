//! Admin listing filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinebook_core::types::id::{ShowId, UserId};

use super::model::Booking;
use super::status::BookingStatus;

/// Optional criteria for listing bookings. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingFilter {
    /// Only bookings in this status.
    pub status: Option<BookingStatus>,
    /// Only bookings for this show.
    pub show_id: Option<ShowId>,
    /// Only bookings owned by this user.
    pub user_id: Option<UserId>,
    /// Created at or after.
    pub created_from: Option<DateTime<Utc>>,
    /// Created at or before.
    pub created_to: Option<DateTime<Utc>>,
}

impl BookingFilter {
    /// In-process evaluation of the filter.
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|s| booking.status == s)
            && self.show_id.is_none_or(|id| booking.show_id == id)
            && self.user_id.is_none_or(|id| booking.user_id == id)
            && self.created_from.is_none_or(|from| booking.created_at >= from)
            && self.created_to.is_none_or(|to| booking.created_at <= to)
    }
}

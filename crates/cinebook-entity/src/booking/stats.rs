//! Aggregate booking statistics.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Totals shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BookingStats {
    /// All bookings ever created.
    pub total_bookings: i64,
    /// Bookings currently confirmed.
    pub confirmed_bookings: i64,
    /// Bookings cancelled.
    pub cancelled_bookings: i64,
    /// Sum of confirmed booking totals, in minor units.
    pub total_revenue: i64,
    /// Bookings created since midnight UTC.
    pub today_bookings: i64,
}

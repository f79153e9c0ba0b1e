//! Seat locking and cancellation policy configuration.

use serde::{Deserialize, Serialize};

/// Booking flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Lifetime of a seat lock in seconds.
    #[serde(default = "default_lock_ttl")]
    pub seat_lock_ttl_seconds: u64,
    /// Maximum number of seats in one lock or confirmation request.
    #[serde(default = "default_max_seats")]
    pub max_seats_per_request: usize,
    /// Cancellations closer than this to the show start are rejected.
    #[serde(default = "default_min_cancellation_hours")]
    pub min_cancellation_hours: i64,
    /// Cancellations at least this far ahead receive a full refund.
    #[serde(default = "default_full_refund_hours")]
    pub full_refund_hours: i64,
    /// Refund percentage between the two thresholds.
    #[serde(default = "default_partial_refund_percent")]
    pub partial_refund_percent: u8,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            seat_lock_ttl_seconds: default_lock_ttl(),
            max_seats_per_request: default_max_seats(),
            min_cancellation_hours: default_min_cancellation_hours(),
            full_refund_hours: default_full_refund_hours(),
            partial_refund_percent: default_partial_refund_percent(),
        }
    }
}

fn default_lock_ttl() -> u64 {
    300
}

fn default_max_seats() -> usize {
    10
}

fn default_min_cancellation_hours() -> i64 {
    2
}

fn default_full_refund_hours() -> i64 {
    24
}

fn default_partial_refund_percent() -> u8 {
    50
}

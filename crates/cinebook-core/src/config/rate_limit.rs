//! Rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Fixed-window, per-user request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether limits are enforced.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seat lock requests per user per window.
    #[serde(default = "default_seat_lock")]
    pub seat_lock_per_minute: u64,
    /// Booking confirmations per user per window.
    #[serde(default = "default_booking")]
    pub booking_per_minute: u64,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            seat_lock_per_minute: default_seat_lock(),
            booking_per_minute: default_booking(),
            window_seconds: default_window(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_seat_lock() -> u64 {
    20
}

fn default_booking() -> u64 {
    5
}

fn default_window() -> u64 {
    60
}

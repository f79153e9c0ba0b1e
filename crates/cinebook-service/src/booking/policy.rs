//! Cancellation refund policy.

use cinebook_core::config::BookingConfig;
use cinebook_core::error::AppError;

/// Refund tiers by time remaining before the show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    /// Below this many hours, cancellation is refused.
    pub min_hours: i64,
    /// At or above this many hours, the refund is full.
    pub full_refund_hours: i64,
    /// Refund percentage in between.
    pub partial_percent: u8,
}

impl CancellationPolicy {
    /// Build the policy from booking configuration.
    pub fn from_config(config: &BookingConfig) -> Self {
        Self {
            min_hours: config.min_cancellation_hours,
            full_refund_hours: config.full_refund_hours,
            partial_percent: config.partial_refund_percent.min(100),
        }
    }

    /// Refund owed for cancelling a booking of `total` minor units
    /// `hours_until_start` hours before the show. Partial refunds round down.
    pub fn refund_amount(&self, total: i64, hours_until_start: f64) -> Result<i64, AppError> {
        if hours_until_start < self.min_hours as f64 {
            return Err(AppError::policy(format!(
                "Cannot cancel booking within {} hours of show time",
                self.min_hours
            )));
        }
        if hours_until_start < self.full_refund_hours as f64 {
            return Ok(total * i64::from(self.partial_percent) / 100);
        }
        Ok(total)
    }
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self::from_config(&BookingConfig::default())
    }
}

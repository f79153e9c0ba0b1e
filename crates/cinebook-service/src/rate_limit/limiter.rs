//! Fixed-window counters kept in the lock store.
//!
//! The first hit in a window creates the counter and sets its expiry. When
//! the lock store is unavailable every request is allowed.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use cinebook_cache::keys;
use cinebook_core::config::RateLimitConfig;
use cinebook_core::error::AppError;
use cinebook_core::traits::LockStore;

/// Counter scope for seat lock endpoints.
pub const SEAT_LOCK_SCOPE: &str = "seatlock";
/// Counter scope for booking confirmation.
pub const BOOKING_SCOPE: &str = "booking";

/// Result of one rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Requests allowed per window.
    pub limit: u64,
    /// Requests left in the current window.
    pub remaining: u64,
    /// Seconds until the window resets.
    pub reset_after_seconds: u64,
}

/// Fixed-window request limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    locks: Arc<dyn LockStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    pub fn new(locks: Arc<dyn LockStore>, config: RateLimitConfig) -> Self {
        Self { locks, config }
    }

    /// Whether limits are enforced at all.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Check the seat lock limit for `caller`.
    pub async fn check_seat_lock(&self, caller: impl Display) -> RateLimitDecision {
        self.check(SEAT_LOCK_SCOPE, caller, self.config.seat_lock_per_minute)
            .await
    }

    /// Check the booking confirmation limit for `caller`.
    pub async fn check_booking(&self, caller: impl Display) -> RateLimitDecision {
        self.check(BOOKING_SCOPE, caller, self.config.booking_per_minute)
            .await
    }

    /// Count one request against `scope` for `caller`.
    pub async fn check(&self, scope: &str, caller: impl Display, limit: u64) -> RateLimitDecision {
        let window = self.config.window_seconds.max(1);
        if !self.config.enabled {
            return RateLimitDecision {
                allowed: true,
                limit,
                remaining: limit,
                reset_after_seconds: window,
            };
        }

        let key = keys::rate_limit(scope, caller);
        match self.count(&key, window).await {
            Ok((current, ttl)) => RateLimitDecision {
                allowed: current <= limit,
                limit,
                remaining: limit.saturating_sub(current),
                reset_after_seconds: ttl,
            },
            Err(e) => {
                warn!(key = %key, error = %e, "Rate limit check failed; allowing request");
                RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit,
                    reset_after_seconds: window,
                }
            }
        }
    }

    async fn count(&self, key: &str, window: u64) -> Result<(u64, u64), AppError> {
        let window_duration = Duration::from_secs(window);
        let current = self.locks.incr(key).await?;
        if current == 1 {
            self.locks.expire(key, window_duration).await?;
        }

        let mut ttl = self.locks.ttl(key).await?;
        if ttl < 0 {
            // A counter without expiry would never reset.
            self.locks.expire(key, window_duration).await?;
            ttl = window as i64;
        }
        Ok((current.max(0) as u64, ttl as u64))
    }
}

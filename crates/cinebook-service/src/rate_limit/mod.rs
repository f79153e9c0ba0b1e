//! Per-user fixed-window rate limiting.

pub mod limiter;

pub use limiter::{RateLimitDecision, RateLimiter};

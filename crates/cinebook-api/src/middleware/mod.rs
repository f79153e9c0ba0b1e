//! Axum middleware stack.

pub mod cors;
pub mod idempotency;
pub mod logging;
pub mod rate_limit;

//! Idempotency Guard for booking confirmation.

pub mod guard;

pub use guard::{IDEMPOTENCY_TTL, IdempotencyGuard, IdempotencyStart, StoredResponse};

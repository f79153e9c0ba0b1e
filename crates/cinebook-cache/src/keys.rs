//! Key builders for every entry the booking flow writes to the lock store.

use std::fmt::Display;

// ── Seat locks ─────────────────────────────────────────────

/// Lock key for one seat of one show.
pub fn seat_lock(show_id: impl Display, seat_id: &str) -> String {
    format!("seat_lock:{show_id}:{seat_id}")
}

// ── Idempotency ────────────────────────────────────────────

/// Stored response for an idempotency key.
pub fn idempotency_record(key: &str) -> String {
    format!("idempotency:{key}")
}

/// Marker held while the first request for an idempotency key is running.
pub fn idempotency_in_flight(key: &str) -> String {
    format!("idempotency:{key}:in_flight")
}

// ── Rate limits ────────────────────────────────────────────

/// Fixed-window counter for one limiter scope and caller.
pub fn rate_limit(scope: &str, caller: impl Display) -> String {
    format!("{scope}:{caller}")
}

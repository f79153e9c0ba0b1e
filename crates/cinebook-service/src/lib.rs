//! # cinebook-service
//!
//! Business logic for seat reservation and booking confirmation. Each
//! service receives its collaborators (`LockStore`, `BookingStore`,
//! `RefundStore`, `PaymentClient`) as `Arc` references at construction.
//!
//! - `seat`: Seat Lock Manager: advisory, expiring per-seat locks
//! - `booking`: Booking Transaction Coordinator plus read-side queries
//! - `idempotency`: Replay of stored confirmation responses
//! - `refund`: Refund Compensator over the durable refund queue
//! - `rate_limit`: Fixed-window per-user counters

pub mod booking;
pub mod context;
pub mod idempotency;
pub mod rate_limit;
pub mod refund;
pub mod seat;

#[cfg(test)]
pub(crate) mod testing;

pub use booking::{BookingQueryService, BookingService, CancelBookingRequest, ConfirmBookingRequest};
pub use context::RequestContext;
pub use idempotency::{IdempotencyGuard, IdempotencyStart, StoredResponse};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use refund::{RefundCompensator, SweepReport};
pub use seat::{LockOutcome, LockStatus, SeatLockManager};

//! Request DTOs with validation.
//!
//! Seat id format is checked by the seat lock manager; these rules only
//! bound sizes.

use serde::{Deserialize, Serialize};
use validator::Validate;

use cinebook_core::types::id::ShowId;
use cinebook_service::{CancelBookingRequest, ConfirmBookingRequest};

/// Lock one seat.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LockSeatRequest {
    /// Show ID.
    pub show_id: ShowId,
    /// Seat ID, e.g. `A12`.
    #[validate(length(min = 1, max = 16, message = "Seat id is required"))]
    pub seat_id: String,
}

/// Lock, or release, several seats.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SeatsRequest {
    /// Show ID.
    pub show_id: ShowId,
    /// Seat IDs.
    #[validate(length(min = 1, max = 10, message = "Select between 1 and 10 seats"))]
    pub seat_ids: Vec<String>,
}

/// Extend a seat lock.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtendLockRequest {
    /// Show ID.
    pub show_id: ShowId,
    /// Seat ID.
    #[validate(length(min = 1, max = 16, message = "Seat id is required"))]
    pub seat_id: String,
    /// New lifetime in seconds; defaults to the lock TTL.
    #[validate(range(min = 1, max = 3600))]
    pub ttl_seconds: Option<u64>,
}

/// Confirm a booking.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmRequest {
    /// Show ID.
    pub show_id: ShowId,
    /// Seats to book.
    #[validate(length(min = 1, max = 10, message = "Select between 1 and 10 seats"))]
    pub seat_ids: Vec<String>,
    /// Payment source token.
    #[validate(length(min = 1, message = "Payment token is required"))]
    pub payment_token: String,
}

impl From<ConfirmRequest> for ConfirmBookingRequest {
    fn from(req: ConfirmRequest) -> Self {
        Self {
            show_id: req.show_id,
            seats: req.seat_ids,
            payment_token: req.payment_token,
        }
    }
}

/// Cancel a booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelRequest {
    /// Optional reason.
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

impl From<CancelRequest> for CancelBookingRequest {
    fn from(req: CancelRequest) -> Self {
        Self { reason: req.reason }
    }
}

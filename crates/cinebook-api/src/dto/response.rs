//! Response DTOs.

use serde::{Deserialize, Serialize};

use cinebook_core::types::id::ShowId;
use cinebook_entity::refund::QueuedRefund;
use cinebook_payment::BreakerSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// One seat lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatLockResponse {
    /// Show ID.
    pub show_id: ShowId,
    /// Seat ID.
    pub seat_id: String,
    /// Whether the seat is locked.
    pub locked: bool,
    /// Remaining lifetime in seconds.
    pub ttl_seconds: i64,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Queued refunds, split by whether they will be retried.
#[derive(Debug, Clone, Serialize)]
pub struct RefundQueueResponse {
    /// Entries the sweep will retry.
    pub pending: Vec<QueuedRefund>,
    /// Entries that need manual settlement.
    pub exhausted: Vec<QueuedRefund>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Version.
    pub version: String,
    /// Lock store reachable.
    pub lock_store: bool,
    /// Booking store reachable.
    pub database: bool,
    /// Payment circuit breakers.
    pub payment_breakers: Vec<BreakerSnapshot>,
}

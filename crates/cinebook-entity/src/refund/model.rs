//! Queued refund entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cinebook_core::types::id::{BookingId, RefundEntryId, UserId};

/// A refund waiting to be retried against the payment gateway.
///
/// Entries that exhaust their attempts are kept for manual handling.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueuedRefund {
    /// Unique entry identifier.
    pub id: RefundEntryId,
    /// Charge to refund.
    pub payment_id: String,
    /// Amount to refund, in minor units.
    pub amount: i64,
    /// Booking the refund belongs to (may never have been persisted).
    pub booking_id: BookingId,
    /// Customer to refund.
    pub user_id: UserId,
    /// Why the refund is owed.
    pub reason: String,
    /// Attempts made so far.
    pub attempts: i32,
    /// Error from the most recent attempt.
    pub last_error: Option<String>,
    /// When the most recent attempt ran.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Entry is claimed by a sweep until this instant.
    pub locked_until: Option<DateTime<Utc>>,
    /// When the entry was queued.
    pub created_at: DateTime<Utc>,
    /// When the entry was last updated.
    pub updated_at: DateTime<Utc>,
}

impl QueuedRefund {
    /// Whether the entry has used up its attempts.
    pub fn is_exhausted(&self, max_attempts: i32) -> bool {
        self.attempts >= max_attempts
    }
}

/// Data required to queue a refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQueuedRefund {
    /// Charge to refund.
    pub payment_id: String,
    /// Amount to refund.
    pub amount: i64,
    /// Booking the refund belongs to.
    pub booking_id: BookingId,
    /// Customer.
    pub user_id: UserId,
    /// Why the refund is owed.
    pub reason: String,
}

impl CreateQueuedRefund {
    /// Build a fresh entry with zero attempts.
    pub fn into_entry(self, now: DateTime<Utc>) -> QueuedRefund {
        QueuedRefund {
            id: RefundEntryId::new(),
            payment_id: self.payment_id,
            amount: self.amount,
            booking_id: self.booking_id,
            user_id: self.user_id,
            reason: self.reason,
            attempts: 0,
            last_error: None,
            last_attempt_at: None,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }
}

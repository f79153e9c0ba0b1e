//! Booking entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cinebook_core::types::id::{BookingId, ShowId, UserId};

use super::status::BookingStatus;

/// A confirmed (or later cancelled) purchase of seats for one show.
///
/// The seat list never changes after creation; cancellation only changes
/// the status and the refund fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Owner of the booking.
    pub user_id: UserId,
    /// Show the seats belong to.
    pub show_id: ShowId,
    /// Booked seat identifiers, in request order.
    pub seats: Vec<String>,
    /// Amount charged, in minor units.
    pub total_amount: i64,
    /// Current status.
    pub status: BookingStatus,
    /// Gateway charge identifier.
    pub payment_id: Option<String>,
    /// Gateway refund identifier, once a refund went through.
    pub refund_id: Option<String>,
    /// Amount refunded on cancellation.
    pub refund_amount: Option<i64>,
    /// When the booking was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Reason given on cancellation.
    pub cancellation_reason: Option<String>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether the booking has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Apply cancellation terms. Seats are left untouched.
    pub fn cancel(&mut self, terms: &CancellationTerms) {
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(terms.cancelled_at);
        self.cancellation_reason = terms.reason.clone();
        self.refund_amount = Some(terms.refund_amount);
        self.updated_at = terms.cancelled_at;
    }
}

/// Data required to create a booking inside the commit transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    /// Identifier reserved before charging, so a compensating refund can
    /// reference it even when the row never gets written.
    pub id: BookingId,
    /// Owner.
    pub user_id: UserId,
    /// Show.
    pub show_id: ShowId,
    /// Seats.
    pub seats: Vec<String>,
    /// Amount charged.
    pub total_amount: i64,
    /// Gateway charge identifier.
    pub payment_id: String,
}

impl CreateBooking {
    /// Build the `CONFIRMED` booking row.
    pub fn into_booking(self, now: DateTime<Utc>) -> Booking {
        Booking {
            id: self.id,
            user_id: self.user_id,
            show_id: self.show_id,
            seats: self.seats,
            total_amount: self.total_amount,
            status: BookingStatus::Confirmed,
            payment_id: Some(self.payment_id),
            refund_id: None,
            refund_amount: None,
            cancelled_at: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of the cancellation policy for one booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationTerms {
    /// Amount to refund, in minor units.
    pub refund_amount: i64,
    /// When the cancellation takes effect.
    pub cancelled_at: DateTime<Utc>,
    /// Reason supplied by the customer.
    pub reason: Option<String>,
}

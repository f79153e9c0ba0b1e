//! Show entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cinebook_core::types::id::{EventId, HallId, ShowId};

/// A scheduled screening of an event in a hall.
///
/// `booked_seats` is the authoritative record of sold seats. It only grows
/// through a committed booking and only shrinks through a committed
/// cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Show {
    /// Unique show identifier.
    pub id: ShowId,
    /// The event (film) being screened.
    pub event_id: EventId,
    /// Hall the show runs in.
    pub hall_id: HallId,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Seat capacity.
    pub total_seats: i32,
    /// Flat per-seat price, used when the hall has no price for a seat.
    pub price: i64,
    /// Seats sold for this show, in booking order.
    pub booked_seats: Vec<String>,
    /// When the show was created.
    pub created_at: DateTime<Utc>,
    /// When the show was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Show {
    /// Whether the show has started at `now`.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time
    }

    /// Fractional hours from `now` until the show starts (negative once started).
    pub fn hours_until_start(&self, now: DateTime<Utc>) -> f64 {
        (self.start_time - now).num_milliseconds() as f64 / 3_600_000.0
    }

    /// Returns the requested seats that are already sold.
    pub fn already_booked<'a>(&self, seats: &'a [String]) -> Vec<&'a str> {
        seats
            .iter()
            .filter(|seat| self.booked_seats.contains(seat))
            .map(String::as_str)
            .collect()
    }

    /// Number of seats still available for sale.
    pub fn available_seats(&self) -> i64 {
        i64::from(self.total_seats) - self.booked_seats.len() as i64
    }
}

/// Data required to create a new show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShow {
    /// The event being screened.
    pub event_id: EventId,
    /// Hall the show runs in.
    pub hall_id: HallId,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Seat capacity.
    pub total_seats: i32,
    /// Flat per-seat price.
    pub price: i64,
}

impl CreateShow {
    /// Build the show row with an empty `booked_seats` list.
    pub fn into_show(self) -> Show {
        let now = Utc::now();
        Show {
            id: ShowId::new(),
            event_id: self.event_id,
            hall_id: self.hall_id,
            start_time: self.start_time,
            end_time: self.end_time,
            total_seats: self.total_seats,
            price: self.price,
            booked_seats: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

//! Hall entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use cinebook_core::types::id::HallId;

/// A screening hall. The seat map is owned by the catalog; this side only
/// reads it to price seats.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Hall {
    /// Unique hall identifier.
    pub id: HallId,
    /// Display name.
    pub name: String,
    /// Seat layout with optional per-seat prices.
    pub seat_map: Json<Vec<SeatConfig>>,
    /// When the hall was created.
    pub created_at: DateTime<Utc>,
}

impl Hall {
    /// Price of the seat with the given identifier (`"{row}{number}"`),
    /// if the seat map defines one.
    pub fn seat_price(&self, seat_id: &str) -> Option<i64> {
        self.seat_map
            .iter()
            .find(|seat| seat.seat_id() == seat_id)
            .and_then(|seat| seat.price)
    }
}

/// One seat in a hall's seat map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatConfig {
    /// Row letter.
    pub row: String,
    /// Seat number within the row.
    pub number: u32,
    /// Seat category.
    #[serde(rename = "type", default)]
    pub seat_type: SeatType,
    /// Price override for this seat.
    #[serde(default)]
    pub price: Option<i64>,
}

impl SeatConfig {
    /// Seat identifier as used in bookings, e.g. `"B12"`.
    pub fn seat_id(&self) -> String {
        format!("{}{}", self.row, self.number)
    }
}

/// Seat category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatType {
    /// Standard seat.
    #[default]
    Regular,
    /// Premium seat.
    Vip,
    /// Wheelchair-accessible space.
    Accessible,
}

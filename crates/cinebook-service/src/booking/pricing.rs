//! Seat pricing.

use cinebook_entity::hall::Hall;
use cinebook_entity::show::Show;

/// Total for `seats`: each seat costs its hall seat-map price when the map
/// defines one, otherwise the show's flat price.
pub fn total_amount(show: &Show, hall: Option<&Hall>, seats: &[String]) -> i64 {
    seats
        .iter()
        .map(|seat| {
            hall.and_then(|h| h.seat_price(seat))
                .unwrap_or(show.price)
        })
        .sum()
}

//! Seat identifier rules shared by locking and confirmation.

use std::collections::HashSet;

use cinebook_core::error::AppError;

/// Whether `seat_id` is a row letter followed by a seat number, e.g. `A1` or `B12`.
pub fn is_valid_seat_id(seat_id: &str) -> bool {
    let mut chars = seat_id.chars();
    match chars.next() {
        Some(row) if row.is_ascii_uppercase() => {}
        _ => return false,
    }
    let number = chars.as_str();
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

/// Reject a malformed seat identifier.
pub fn validate_seat_id(seat_id: &str) -> Result<(), AppError> {
    if is_valid_seat_id(seat_id) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Invalid seat format '{seat_id}' (e.g., A1, B12)"
        )))
    }
}

/// Validate a multi-seat request: between 1 and `max` well-formed, distinct seats.
pub fn validate_seat_selection(seats: &[String], max: usize) -> Result<(), AppError> {
    if seats.is_empty() {
        return Err(AppError::validation("At least one seat is required"));
    }
    if seats.len() > max {
        return Err(AppError::validation(format!(
            "Maximum {max} seats per booking"
        )));
    }

    let mut seen = HashSet::with_capacity(seats.len());
    for seat in seats {
        validate_seat_id(seat)?;
        if !seen.insert(seat.as_str()) {
            return Err(AppError::validation(format!("Duplicate seat '{seat}'")));
        }
    }
    Ok(())
}

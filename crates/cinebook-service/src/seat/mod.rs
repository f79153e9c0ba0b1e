//! Seat Lock Manager and seat input validation.

pub mod lock;
pub mod validation;

pub use lock::{LockOutcome, LockStatus, SeatLockManager};
pub use validation::{is_valid_seat_id, validate_seat_id, validate_seat_selection};

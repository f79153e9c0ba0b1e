//! Booking domain entities.

pub mod filter;
pub mod model;
pub mod stats;
pub mod status;

pub use filter::BookingFilter;
pub use model::{Booking, CancellationTerms, CreateBooking};
pub use stats::BookingStats;
pub use status::BookingStatus;

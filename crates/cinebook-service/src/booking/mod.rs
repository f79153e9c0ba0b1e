//! Booking confirmation, cancellation, and read-side queries.

pub mod policy;
pub mod pricing;
pub mod query;
pub mod service;

pub use policy::CancellationPolicy;
pub use query::{BookingQueryService, ShowBookings};
pub use service::{BookingService, CancelBookingRequest, ConfirmBookingRequest};

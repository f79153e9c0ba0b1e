//! PostgreSQL implementations of the store traits.

pub mod booking;
pub mod refund;
pub mod show;
pub mod transaction;

pub use booking::BookingRepository;
pub use refund::RefundRepository;
pub use show::ShowRepository;
pub use transaction::{PgBookingStore, PgBookingTransaction};

//! In-process implementations of the store traits.
//!
//! Used by tests and by `database.provider = "memory"` for local runs.
//! Data does not survive a restart.

pub mod booking;
pub mod refund;

pub use booking::MemoryBookingStore;
pub use refund::MemoryRefundStore;

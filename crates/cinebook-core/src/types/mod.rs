//! Identifier and pagination types shared by every crate.

pub mod id;
pub mod pagination;

pub use id::{BookingId, EventId, HallId, RefundEntryId, ShowId, UserId};
pub use pagination::{PageRequest, PageResponse};

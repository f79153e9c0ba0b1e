//! # cinebook-database
//!
//! The transactional store behind bookings. [`store`] defines the traits the
//! booking flow depends on; [`repositories`] implements them on PostgreSQL
//! and [`memory`] implements them in process for tests and local runs.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{BookingStore, BookingTransaction, RefundStore};

//! Refund Compensator.

pub mod compensator;

pub use compensator::{RefundAttempt, RefundCompensator, SweepReport};

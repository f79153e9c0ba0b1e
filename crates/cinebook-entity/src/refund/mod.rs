//! Queued refund entities.

pub mod model;

pub use model::{CreateQueuedRefund, QueuedRefund};

//! Scheduled screening entities.

pub mod model;

pub use model::{CreateShow, Show};

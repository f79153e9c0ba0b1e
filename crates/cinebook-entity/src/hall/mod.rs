//! Hall and seat map entities.

pub mod model;

pub use model::{Hall, SeatConfig, SeatType};

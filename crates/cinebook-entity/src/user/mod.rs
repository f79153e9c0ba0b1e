//! User-facing entities owned by the booking flow.

pub mod history;
pub mod role;

pub use history::HistoryEntry;
pub use role::UserRole;

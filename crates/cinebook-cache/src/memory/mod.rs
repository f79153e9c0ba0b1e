//! In-memory lock store provider.

pub mod store;

pub use store::MemoryLockStore;

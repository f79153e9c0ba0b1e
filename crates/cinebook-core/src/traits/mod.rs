//! Core traits defined in `cinebook-core` and implemented by other crates.

pub mod lock_store;

pub use lock_store::LockStore;

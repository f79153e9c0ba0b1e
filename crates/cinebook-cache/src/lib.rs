//! # cinebook-cache
//!
//! Lock store implementations for Cinebook. Supports two modes:
//!
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//! - **memory**: In-process store on [dashmap](https://crates.io/crates/dashmap), for
//!   tests and single-node development
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::LockStoreManager;

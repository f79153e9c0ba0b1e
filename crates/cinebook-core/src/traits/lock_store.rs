//! Lock store trait: the key-value collaborator behind seat locks,
//! idempotency records, and rate-limit counters.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// TTL reported for a key that does not exist.
pub const TTL_MISSING: i64 = -2;
/// TTL reported for a key that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// Trait for key-value backends with per-key atomic primitives (Redis or
/// in-memory).
///
/// Implementations only guarantee per-key atomicity. [`set_nx_batch`]
/// executes its writes in one round trip, but each write succeeds or fails
/// independently; callers that need all-or-nothing semantics must release
/// the writes that did succeed.
///
/// [`set_nx_batch`]: LockStore::set_nx_batch
#[async_trait]
pub trait LockStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a value with a TTL, overwriting any existing value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Set a value only if the key does not already exist (`SET NX EX`).
    /// Returns `true` if this call created the key.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Issue one `SET NX EX` per key in a single batch. The result holds one
    /// flag per key, in input order.
    async fn set_nx_batch(&self, keys: &[String], value: &str, ttl: Duration)
    -> AppResult<Vec<bool>>;

    /// Delete a key. Returns `true` if it existed. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AppResult<bool>;

    /// Delete several keys. Returns how many existed.
    async fn delete_many(&self, keys: &[String]) -> AppResult<u64>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Remaining TTL in whole seconds, [`TTL_MISSING`] for an absent key, or
    /// [`TTL_PERSISTENT`] for a key with no expiry.
    async fn ttl(&self, key: &str) -> AppResult<i64>;

    /// Set the TTL on an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Increment an integer value by 1, creating it at 1. Returns the new value.
    async fn incr(&self, key: &str) -> AppResult<i64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

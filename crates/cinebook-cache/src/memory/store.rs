//! In-memory lock store on `DashMap`.
//!
//! Expiry is lazy: an expired entry is treated as absent by every read and
//! overwritten by the next write. Deadlines use `tokio::time::Instant`, so
//! tests can drive them with `tokio::time::pause` and `advance`.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use cinebook_core::error::AppError;
use cinebook_core::result::AppResult;
use cinebook_core::traits::LockStore;
use cinebook_core::traits::lock_store::{TTL_MISSING, TTL_PERSISTENT};

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Some(Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process [`LockStore`] with per-key atomicity from `DashMap` shards.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryLockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, v| v.is_live(now));
        before - self.entries.len()
    }

    fn live_value(&self, key: &str) -> Option<StoredValue> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|v| v.is_live(now))
            .map(|v| v.clone())
    }

    fn set_nx_sync(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    false
                } else {
                    occupied.insert(StoredValue::new(value, ttl));
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(value, ttl));
                true
            }
        }
    }

    fn delete_sync(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .remove(key)
            .is_some_and(|(_, v)| v.is_live(now))
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live_value(key).map(|v| v.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        Ok(self.set_nx_sync(key, value, ttl))
    }

    async fn set_nx_batch(
        &self,
        keys: &[String],
        value: &str,
        ttl: Duration,
    ) -> AppResult<Vec<bool>> {
        Ok(keys
            .iter()
            .map(|key| self.set_nx_sync(key, value, ttl))
            .collect())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        Ok(self.delete_sync(key))
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<u64> {
        Ok(keys.iter().filter(|key| self.delete_sync(key)).count() as u64)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.live_value(key).is_some())
    }

    async fn ttl(&self, key: &str) -> AppResult<i64> {
        let now = Instant::now();
        Ok(match self.live_value(key) {
            None => TTL_MISSING,
            Some(StoredValue {
                expires_at: None, ..
            }) => TTL_PERSISTENT,
            Some(StoredValue {
                expires_at: Some(at),
                ..
            }) => {
                // Round to the nearest second, as Redis does.
                let remaining = at.saturating_duration_since(now).as_millis() as i64;
                (remaining + 500) / 1000
            }
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue {
                value: "0".to_string(),
                expires_at: None,
            });
        if !entry.is_live(now) {
            entry.value = "0".to_string();
            entry.expires_at = None;
        }
        let next = entry
            .value
            .parse::<i64>()
            .map_err(|_| AppError::cache(format!("Value at '{key}' is not an integer")))?
            + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

//! Stores and replays confirmation responses by idempotency key.
//!
//! The first request for a key takes an in-flight marker, runs, and stores
//! its `{status, body}` when the status is below 500. Later requests with
//! the same key get the stored response back verbatim. A request that
//! arrives while the first is still running is told so instead of running
//! a second time.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cinebook_cache::keys;
use cinebook_core::error::AppError;
use cinebook_core::traits::LockStore;

/// Lifetime of a stored response.
pub const IDEMPOTENCY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetime of the in-flight marker; outlives any confirmation attempt.
const IN_FLIGHT_TTL: Duration = Duration::from_secs(120);

/// Longest accepted idempotency key.
const MAX_KEY_LENGTH: usize = 255;

/// A response captured for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body exactly as first sent.
    pub body: String,
}

/// What to do with a request carrying an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyStart {
    /// A response is stored; send it and do nothing else.
    Replay(StoredResponse),
    /// First request for this key; run it and call `complete`.
    Proceed,
    /// Another request with this key is running.
    InFlight,
}

/// Idempotency records kept in the lock store.
#[derive(Debug, Clone)]
pub struct IdempotencyGuard {
    locks: Arc<dyn LockStore>,
}

impl IdempotencyGuard {
    /// Creates a new idempotency guard.
    pub fn new(locks: Arc<dyn LockStore>) -> Self {
        Self { locks }
    }

    /// Scope a client key to its caller so different users cannot collide.
    pub fn scoped_key(caller: impl Display, key: &str) -> Result<String, AppError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::validation("Idempotency-Key must not be empty"));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(AppError::validation(format!(
                "Idempotency-Key must be at most {MAX_KEY_LENGTH} characters"
            )));
        }
        Ok(format!("{caller}:{key}"))
    }

    /// Decide how to handle a request with `key`.
    pub async fn begin(&self, key: &str) -> Result<IdempotencyStart, AppError> {
        if let Some(stored) = self.load(key).await? {
            debug!(idempotency_key = key, status = stored.status, "Replaying stored response");
            return Ok(IdempotencyStart::Replay(stored));
        }

        let marker = keys::idempotency_in_flight(key);
        if self.locks.set_nx(&marker, "1", IN_FLIGHT_TTL).await? {
            return Ok(IdempotencyStart::Proceed);
        }

        // The first request may have finished between the two reads.
        match self.load(key).await? {
            Some(stored) => Ok(IdempotencyStart::Replay(stored)),
            None => Ok(IdempotencyStart::InFlight),
        }
    }

    /// Store the outcome of a request that was told to proceed. Server
    /// errors are not stored so the client can retry with the same key.
    /// The in-flight marker is dropped even when storing fails.
    pub async fn complete(&self, key: &str, response: &StoredResponse) -> Result<(), AppError> {
        let stored = if response.status < 500 {
            self.store(key, response).await.map(|()| true)
        } else {
            Ok(false)
        };
        let released = self.release(key).await;
        let stored = stored?;
        debug!(idempotency_key = key, status = response.status, stored, "Idempotent request completed");
        released
    }

    async fn store(&self, key: &str, response: &StoredResponse) -> Result<(), AppError> {
        let payload = serde_json::to_string(response)?;
        self.locks
            .set(&keys::idempotency_record(key), &payload, IDEMPOTENCY_TTL)
            .await
    }

    /// Drop the in-flight marker without storing anything.
    pub async fn release(&self, key: &str) -> Result<(), AppError> {
        self.locks.delete(&keys::idempotency_in_flight(key)).await?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<StoredResponse>, AppError> {
        let Some(raw) = self.locks.get(&keys::idempotency_record(key)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                warn!(idempotency_key = key, error = %e, "Discarding unreadable idempotency record");
                Ok(None)
            }
        }
    }
}

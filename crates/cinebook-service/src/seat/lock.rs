//! Seat Lock Manager.
//!
//! Locks are advisory: they keep two shoppers from reaching payment for the
//! same seat at once. Whether a seat is sold is decided only by the show's
//! `booked_seats`, re-checked inside the commit transaction.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cinebook_cache::keys;
use cinebook_core::config::BookingConfig;
use cinebook_core::error::AppError;
use cinebook_core::traits::LockStore;
use cinebook_core::types::id::{ShowId, UserId};
use cinebook_database::BookingStore;

use super::validation::{validate_seat_id, validate_seat_selection};

/// Result of a multi-seat lock. Either every seat is in `locked`, or
/// `locked` is empty and every requested seat is in `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOutcome {
    /// Seats now held by the caller.
    pub locked: Vec<String>,
    /// Seats that could not be locked.
    pub failed: Vec<String>,
}

impl LockOutcome {
    fn all_failed(seats: &[String]) -> Self {
        Self {
            locked: Vec::new(),
            failed: seats.to_vec(),
        }
    }

    /// Whether every requested seat was locked.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lock state of one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    /// Whether a lock currently exists.
    pub is_locked: bool,
    /// Remaining lifetime in seconds; 0 when unlocked.
    pub ttl_seconds: i64,
}

/// Creates, inspects, extends, and releases seat locks.
#[derive(Debug, Clone)]
pub struct SeatLockManager {
    /// Lock store holding `seat_lock:*` keys.
    locks: Arc<dyn LockStore>,
    /// Store used to reject seats that are already sold.
    store: Arc<dyn BookingStore>,
    /// Lock lifetime.
    lock_ttl: Duration,
    /// Maximum seats per request.
    max_seats: usize,
}

impl SeatLockManager {
    /// Creates a new seat lock manager.
    pub fn new(
        locks: Arc<dyn LockStore>,
        store: Arc<dyn BookingStore>,
        config: &BookingConfig,
    ) -> Self {
        Self {
            locks,
            store,
            lock_ttl: Duration::from_secs(config.seat_lock_ttl_seconds),
            max_seats: config.max_seats_per_request,
        }
    }

    /// Lifetime given to new locks.
    pub fn lock_ttl(&self) -> Duration {
        self.lock_ttl
    }

    /// Lock one seat for `holder`. Returns `false` without side effects if
    /// someone already holds it.
    pub async fn lock_seat(
        &self,
        show_id: ShowId,
        seat_id: &str,
        holder: UserId,
    ) -> Result<bool, AppError> {
        validate_seat_id(seat_id)?;

        let key = keys::seat_lock(show_id, seat_id);
        let created = self
            .locks
            .set_nx(&key, &holder.to_string(), self.lock_ttl)
            .await?;

        if created {
            info!(show_id = %show_id, seat_id, user_id = %holder, "Seat locked");
        } else {
            debug!(show_id = %show_id, seat_id, "Seat lock already held");
        }
        Ok(created)
    }

    /// Lock several seats all-or-nothing.
    ///
    /// Seats already sold fail the whole request before any lock is taken.
    /// If the batch only partly succeeds, the locks it did take are released
    /// before returning.
    pub async fn lock_seats(
        &self,
        show_id: ShowId,
        seat_ids: &[String],
        holder: UserId,
    ) -> Result<LockOutcome, AppError> {
        validate_seat_selection(seat_ids, self.max_seats)?;

        let show = self
            .store
            .find_show(show_id)
            .await?
            .ok_or_else(|| AppError::not_found("Show not found"))?;

        let sold = show.already_booked(seat_ids);
        if !sold.is_empty() {
            info!(show_id = %show_id, seat_ids = ?sold, "Seat lock refused: already booked");
            return Ok(LockOutcome::all_failed(seat_ids));
        }

        let lock_keys: Vec<String> = seat_ids
            .iter()
            .map(|seat| keys::seat_lock(show_id, seat))
            .collect();
        let results = self
            .locks
            .set_nx_batch(&lock_keys, &holder.to_string(), self.lock_ttl)
            .await?;

        let (acquired, contended): (Vec<_>, Vec<_>) = lock_keys
            .into_iter()
            .zip(results)
            .partition(|(_, created)| *created);

        if contended.is_empty() {
            info!(show_id = %show_id, seat_ids = ?seat_ids, user_id = %holder, "Seats locked");
            return Ok(LockOutcome {
                locked: seat_ids.to_vec(),
                failed: Vec::new(),
            });
        }

        if !acquired.is_empty() {
            let taken: Vec<String> = acquired.into_iter().map(|(key, _)| key).collect();
            if let Err(e) = self.locks.delete_many(&taken).await {
                // The leftover locks still expire on their own.
                warn!(show_id = %show_id, error = %e, "Failed to release partial seat locks");
            }
        }

        info!(
            show_id = %show_id,
            seat_ids = ?seat_ids,
            contended = contended.len(),
            "Seat lock refused: some seats held by others"
        );
        Ok(LockOutcome::all_failed(seat_ids))
    }

    /// Release one seat lock. Missing locks are not an error.
    pub async fn unlock(&self, show_id: ShowId, seat_id: &str) -> Result<(), AppError> {
        self.locks.delete(&keys::seat_lock(show_id, seat_id)).await?;
        debug!(show_id = %show_id, seat_id, "Seat unlocked");
        Ok(())
    }

    /// Release several seat locks. Missing locks are not an error.
    pub async fn unlock_many(&self, show_id: ShowId, seat_ids: &[String]) -> Result<(), AppError> {
        if seat_ids.is_empty() {
            return Ok(());
        }
        let lock_keys: Vec<String> = seat_ids
            .iter()
            .map(|seat| keys::seat_lock(show_id, seat))
            .collect();
        let removed = self.locks.delete_many(&lock_keys).await?;
        debug!(show_id = %show_id, requested = seat_ids.len(), removed, "Seats unlocked");
        Ok(())
    }

    /// Current lock state of a seat.
    pub async fn status(&self, show_id: ShowId, seat_id: &str) -> Result<LockStatus, AppError> {
        let key = keys::seat_lock(show_id, seat_id);
        let (exists, ttl) = futures::try_join!(self.locks.exists(&key), self.locks.ttl(&key))?;
        Ok(LockStatus {
            is_locked: exists,
            ttl_seconds: ttl.max(0),
        })
    }

    /// Reset the lifetime of an existing lock to `seconds` (default: the
    /// lock TTL). Returns `false` if the lock has already expired; an
    /// expired lock is never recreated.
    pub async fn extend(
        &self,
        show_id: ShowId,
        seat_id: &str,
        seconds: Option<u64>,
    ) -> Result<bool, AppError> {
        let ttl = match seconds {
            Some(0) => return Err(AppError::validation("Extension must be at least 1 second")),
            Some(secs) => Duration::from_secs(secs),
            None => self.lock_ttl,
        };

        let extended = self
            .locks
            .expire(&keys::seat_lock(show_id, seat_id), ttl)
            .await?;
        debug!(show_id = %show_id, seat_id, extended, "Seat lock extension");
        Ok(extended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, seats};
    use cinebook_core::error::ErrorKind;

    #[tokio::test]
    async fn test_second_holder_is_refused() {
        let fx = Fixture::new().await;
        let u1 = UserId::new();
        let u2 = UserId::new();

        assert!(fx.seats.lock_seat(fx.show_id, "A1", u1).await.expect("lock"));
        assert!(!fx.seats.lock_seat(fx.show_id, "A1", u2).await.expect("lock"));

        let holder = fx
            .lock_store
            .get(&keys::seat_lock(fx.show_id, "A1"))
            .await
            .expect("get");
        assert_eq!(holder, Some(u1.to_string()));
    }

    #[tokio::test]
    async fn test_lock_seat_rejects_bad_format() {
        let fx = Fixture::new().await;
        let err = fx
            .seats
            .lock_seat(fx.show_id, "a1", UserId::new())
            .await
            .expect_err("invalid");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_partial_batch_leaves_nothing_locked() {
        let fx = Fixture::new().await;
        let other = UserId::new();
        assert!(fx.seats.lock_seat(fx.show_id, "A2", other).await.expect("lock"));

        let outcome = fx
            .seats
            .lock_seats(fx.show_id, &seats(&["A1", "A2", "A3"]), UserId::new())
            .await
            .expect("lock_seats");

        assert!(outcome.locked.is_empty());
        assert_eq!(outcome.failed, seats(&["A1", "A2", "A3"]));
        assert!(!fx.seats.status(fx.show_id, "A1").await.expect("status").is_locked);
        assert!(!fx.seats.status(fx.show_id, "A3").await.expect("status").is_locked);
        assert!(fx.seats.status(fx.show_id, "A2").await.expect("status").is_locked);
    }

    #[tokio::test]
    async fn test_booked_seat_fails_whole_request() {
        let fx = Fixture::with_booked(&["A2"]).await;

        let outcome = fx
            .seats
            .lock_seats(fx.show_id, &seats(&["A2", "A3"]), UserId::new())
            .await
            .expect("lock_seats");

        assert!(outcome.locked.is_empty());
        assert_eq!(outcome.failed, seats(&["A2", "A3"]));
        assert!(!fx.seats.status(fx.show_id, "A3").await.expect("status").is_locked);
    }

    #[tokio::test]
    async fn test_lock_seats_unknown_show() {
        let fx = Fixture::new().await;
        let err = fx
            .seats
            .lock_seats(ShowId::new(), &seats(&["A1"]), UserId::new())
            .await
            .expect_err("missing show");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_lock_seats_success_and_unlock_many() {
        let fx = Fixture::new().await;
        let outcome = fx
            .seats
            .lock_seats(fx.show_id, &seats(&["B1", "B2"]), UserId::new())
            .await
            .expect("lock_seats");
        assert!(outcome.is_complete());
        assert_eq!(outcome.locked, seats(&["B1", "B2"]));

        fx.seats
            .unlock_many(fx.show_id, &seats(&["B1", "B2", "B3"]))
            .await
            .expect("unlock");
        assert!(!fx.seats.status(fx.show_id, "B1").await.expect("status").is_locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_expires_after_ttl() {
        let fx = Fixture::new().await;
        fx.seats
            .lock_seat(fx.show_id, "C1", UserId::new())
            .await
            .expect("lock");

        tokio::time::advance(Duration::from_secs(301)).await;
        let status = fx.seats.status(fx.show_id, "C1").await.expect("status");
        assert_eq!(
            status,
            LockStatus {
                is_locked: false,
                ttl_seconds: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_resets_expiry() {
        let fx = Fixture::new().await;
        fx.seats
            .lock_seat(fx.show_id, "C1", UserId::new())
            .await
            .expect("lock");

        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(fx.seats.extend(fx.show_id, "C1", None).await.expect("extend"));

        // Original expiry (T+300) has passed; the extended one (T+400) has not.
        tokio::time::advance(Duration::from_secs(250)).await;
        let status = fx.seats.status(fx.show_id, "C1").await.expect("status");
        assert!(status.is_locked);
        assert_eq!(status.ttl_seconds, 50);

        tokio::time::advance(Duration::from_secs(51)).await;
        assert!(!fx.seats.status(fx.show_id, "C1").await.expect("status").is_locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_after_expiry_is_noop() {
        let fx = Fixture::new().await;
        fx.seats
            .lock_seat(fx.show_id, "C1", UserId::new())
            .await
            .expect("lock");

        tokio::time::advance(Duration::from_secs(400)).await;
        assert!(!fx.seats.extend(fx.show_id, "C1", None).await.expect("extend"));
        assert!(!fx.seats.status(fx.show_id, "C1").await.expect("status").is_locked);
    }
}

//! Circuit breaker for calls to an unreliable downstream dependency.
//!
//! # States
//!
//! - **Closed**: calls pass through and their outcomes are recorded in a
//!   rolling window. Once the window holds at least `volume_threshold`
//!   outcomes and the failure percentage reaches `error_threshold_percentage`,
//!   the circuit opens.
//! - **Open**: calls are rejected without touching the dependency until
//!   `reset_timeout` has elapsed.
//! - **HalfOpen**: up to `half_open_max_calls` trial calls are admitted. A
//!   successful trial closes the circuit, a failed one reopens it.
//!
//! Every call is bounded by `call_timeout`; a timeout counts as a failure.
//! The state lock is never held across the wrapped call. A trial whose future
//! is dropped before finishing gives its slot back.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use cinebook_core::config::BreakerSettings;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Requests pass through normally.
    Closed,
    /// Requests fail immediately.
    Open,
    /// Trial requests test whether the dependency recovered.
    HalfOpen,
}

/// Errors from circuit breaker operations.
#[derive(Error, Debug)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, request rejected.
    #[error("Circuit breaker is open")]
    Open,
    /// Operation exceeded the per-call timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    /// Operation failed.
    #[error("Operation failed: {0}")]
    Inner(E),
}

/// Point-in-time view of a breaker, for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    /// Breaker name.
    pub name: String,
    /// Current state.
    pub state: State,
    /// Outcomes in the rolling window.
    pub window_calls: usize,
    /// Failures in the rolling window.
    pub window_failures: usize,
    /// Calls rejected while open since start-up.
    pub total_rejections: u64,
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    /// Half-open trial, tagged with the half-open epoch it was admitted in.
    Trial(u64),
}

#[derive(Debug)]
struct BreakerState {
    state: State,
    /// `(finished_at, succeeded)` per call, oldest first.
    window: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
    /// Bumped on every OPEN -> HALF_OPEN transition.
    half_open_epoch: u64,
}

impl BreakerState {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some((at, _)) = self.window.front() {
            if now.duration_since(*at) > window {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn failures(&self) -> usize {
        self.window.iter().filter(|(_, ok)| !ok).count()
    }

    fn trip(&mut self, now: Instant) {
        self.state = State::Open;
        self.opened_at = Some(now);
        self.trials_in_flight = 0;
        self.window.clear();
    }
}

/// Circuit breaker guarding one downstream operation.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    settings: Arc<BreakerSettings>,
    state: Arc<Mutex<BreakerState>>,
    total_rejections: Arc<AtomicU64>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: &str, settings: BreakerSettings) -> Self {
        Self {
            name: Arc::from(name),
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(BreakerState {
                state: State::Closed,
                window: VecDeque::new(),
                opened_at: None,
                trials_in_flight: 0,
                half_open_epoch: 0,
            })),
            total_rejections: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Breaker name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, promoting Open to HalfOpen once the reset interval passed.
    pub fn state(&self) -> State {
        let mut state = self.lock();
        self.promote_if_due(&mut state, Instant::now());
        state.state
    }

    /// Snapshot for health and admin views.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = Instant::now();
        let mut state = self.lock();
        self.promote_if_due(&mut state, now);
        state.prune(now, self.settings.rolling_window());
        BreakerSnapshot {
            name: self.name.to_string(),
            state: state.state,
            window_calls: state.window.len(),
            window_failures: state.failures(),
            total_rejections: self.total_rejections.load(Ordering::Relaxed),
        }
    }

    /// Call an operation through the breaker.
    ///
    /// # Errors
    ///
    /// - `CircuitBreakerError::Open` if the call was rejected without running.
    /// - `CircuitBreakerError::Timeout` if the call exceeded `call_timeout`.
    /// - `CircuitBreakerError::Inner` if the operation itself failed.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.admit() else {
            self.total_rejections.fetch_add(1, Ordering::Relaxed);
            return Err(CircuitBreakerError::Open);
        };

        let timeout = self.settings.call_timeout();
        match tokio::time::timeout(timeout, operation()).await {
            Ok(Ok(value)) => {
                permit.succeed();
                Ok(value)
            }
            Ok(Err(err)) => {
                permit.fail();
                Err(CircuitBreakerError::Inner(err))
            }
            Err(_) => {
                permit.fail();
                Err(CircuitBreakerError::Timeout(timeout))
            }
        }
    }

    /// Force the breaker closed and forget recorded outcomes.
    pub fn reset(&self) {
        let mut state = self.lock();
        info!(breaker = %self.name, "Circuit breaker manually reset to CLOSED");
        state.state = State::Closed;
        state.window.clear();
        state.opened_at = None;
        state.trials_in_flight = 0;
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn promote_if_due(&self, state: &mut BreakerState, now: Instant) {
        if state.state != State::Open {
            return;
        }
        let due = state
            .opened_at
            .is_none_or(|at| now.duration_since(at) >= self.settings.reset_timeout());
        if due {
            info!(breaker = %self.name, state = "HALF_OPEN", "Circuit breaker transitioning OPEN -> HALF_OPEN");
            state.state = State::HalfOpen;
            state.trials_in_flight = 0;
            state.half_open_epoch += 1;
        }
    }

    fn admit(&self) -> Option<Permit<'_>> {
        let mut state = self.lock();
        self.promote_if_due(&mut state, Instant::now());

        let admission = match state.state {
            State::Closed => Admission::Normal,
            State::Open => return None,
            State::HalfOpen => {
                if state.trials_in_flight >= self.settings.half_open_max_calls {
                    return None;
                }
                state.trials_in_flight += 1;
                Admission::Trial(state.half_open_epoch)
            }
        };
        Some(Permit {
            breaker: self,
            admission,
            settled: false,
        })
    }

    fn on_success(&self, admission: Admission) {
        let now = Instant::now();
        let mut state = self.lock();

        if let Admission::Trial(_) = admission {
            if state.state == State::HalfOpen {
                info!(breaker = %self.name, state = "CLOSED", "Circuit breaker transitioning HALF_OPEN -> CLOSED");
                state.state = State::Closed;
                state.window.clear();
                state.opened_at = None;
                state.trials_in_flight = 0;
            }
            return;
        }

        state.window.push_back((now, true));
        state.prune(now, self.settings.rolling_window());
    }

    fn on_failure(&self, admission: Admission) {
        let now = Instant::now();
        let mut state = self.lock();

        if let Admission::Trial(_) = admission {
            if state.state == State::HalfOpen {
                warn!(breaker = %self.name, state = "OPEN", "Circuit breaker transitioning HALF_OPEN -> OPEN (recovery failed)");
                state.trip(now);
            }
            return;
        }

        state.window.push_back((now, false));
        state.prune(now, self.settings.rolling_window());

        if state.state != State::Closed {
            return;
        }

        let total = state.window.len();
        let failures = state.failures();
        let threshold = usize::from(self.settings.error_threshold_percentage);
        if total >= self.settings.volume_threshold as usize && failures * 100 >= threshold * total {
            warn!(
                breaker = %self.name,
                state = "OPEN",
                failures,
                total,
                "Circuit breaker transitioning CLOSED -> OPEN"
            );
            state.trip(now);
        }
    }

    /// Give back the slot of a trial that never reported an outcome.
    fn abandon_trial(&self, epoch: u64) {
        let mut state = self.lock();
        if state.state == State::HalfOpen && state.half_open_epoch == epoch {
            state.trials_in_flight = state.trials_in_flight.saturating_sub(1);
            warn!(breaker = %self.name, "Half-open trial call abandoned; slot released");
        }
    }
}

/// An admitted call. Must be settled with `succeed` or `fail`; dropping it
/// unsettled releases a half-open trial slot without recording an outcome.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl Permit<'_> {
    fn succeed(mut self) {
        self.settled = true;
        self.breaker.on_success(self.admission);
    }

    fn fail(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.admission);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Admission::Trial(epoch) = self.admission {
            self.breaker.abandon_trial(epoch);
        }
    }
}

//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use cinebook_auth::JwtDecoder;
use cinebook_core::config::AppConfig;
use cinebook_core::traits::LockStore;
use cinebook_database::{BookingStore, RefundStore};
use cinebook_payment::PaymentClient;
use cinebook_service::{
    BookingQueryService, BookingService, IdempotencyGuard, RateLimiter, RefundCompensator,
    SeatLockManager,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// Every field is cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Lock store (Redis or in-memory)
    pub lock_store: Arc<dyn LockStore>,
    /// Transactional booking store
    pub store: Arc<dyn BookingStore>,
    /// Payment client, for breaker health
    pub payments: PaymentClient,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Seat lock manager
    pub seat_locks: SeatLockManager,
    /// Booking confirmation and cancellation
    pub bookings: BookingService,
    /// Booking lookups and admin views
    pub queries: BookingQueryService,
    /// Refund queue
    pub refunds: RefundCompensator,
    /// Stored confirmation responses
    pub idempotency: IdempotencyGuard,
    /// Per-user request limits
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Wire every service from its collaborators.
    pub fn new(
        config: AppConfig,
        lock_store: Arc<dyn LockStore>,
        store: Arc<dyn BookingStore>,
        refund_store: Arc<dyn RefundStore>,
        payments: PaymentClient,
    ) -> Self {
        let seat_locks =
            SeatLockManager::new(Arc::clone(&lock_store), Arc::clone(&store), &config.booking);
        let refunds = RefundCompensator::new(
            refund_store,
            Arc::clone(&store),
            payments.clone(),
            config.refunds.clone(),
        );
        let bookings = BookingService::new(
            Arc::clone(&store),
            seat_locks.clone(),
            payments.clone(),
            refunds.clone(),
            &config.booking,
        );
        let queries = BookingQueryService::new(Arc::clone(&store));
        let idempotency = IdempotencyGuard::new(Arc::clone(&lock_store));
        let rate_limiter = RateLimiter::new(Arc::clone(&lock_store), config.rate_limit.clone());
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

        Self {
            config: Arc::new(config),
            lock_store,
            store,
            payments,
            jwt_decoder,
            seat_locks,
            bookings,
            queries,
            refunds,
            idempotency,
            rate_limiter,
        }
    }
}

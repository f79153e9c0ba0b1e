//! Wires the stores, services, worker, and HTTP server together.

use std::sync::Arc;

use cinebook_api::{AppState, build_router};
use cinebook_cache::LockStoreManager;
use cinebook_core::config::AppConfig;
use cinebook_core::error::AppError;
use cinebook_core::traits::LockStore;
use cinebook_database::memory::{MemoryBookingStore, MemoryRefundStore};
use cinebook_database::{BookingStore, DatabasePool, RefundStore};
use cinebook_payment::PaymentClient;
use cinebook_worker::CronScheduler;

/// Run the server until a shutdown signal arrives.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Cinebook v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Transactional store ──────────────────────────────
    let (store, refund_store, db) = match config.database.provider.as_str() {
        "postgres" => {
            let db = DatabasePool::connect(&config.database).await?;
            let store: Arc<dyn BookingStore> = Arc::new(db.booking_store());
            let refund_store: Arc<dyn RefundStore> = Arc::new(db.refund_store());
            (store, refund_store, Some(db))
        }
        "memory" => {
            tracing::warn!("Using the in-memory booking store; data is lost on restart");
            let store: Arc<dyn BookingStore> = Arc::new(MemoryBookingStore::new());
            let refund_store: Arc<dyn RefundStore> = Arc::new(MemoryRefundStore::new());
            (store, refund_store, None)
        }
        other => {
            return Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: postgres, memory"
            )));
        }
    };

    // ── Step 2: Lock store ───────────────────────────────────────
    tracing::info!(
        "Initializing lock store (provider: {})...",
        config.lock_store.provider
    );
    let lock_store: Arc<dyn LockStore> =
        Arc::new(LockStoreManager::new(&config.lock_store).await?);

    // ── Step 3: Payment gateway ──────────────────────────────────
    tracing::info!(
        "Initializing payment gateway (provider: {})...",
        config.payment.provider
    );
    let payments = PaymentClient::from_config(&config.payment)?;

    // ── Step 4: Services ─────────────────────────────────────────
    let shutdown_grace = config.server.shutdown_grace();
    let addr = config.server.bind_address();
    let worker_enabled = config.worker.enabled;
    let refund_config = config.refunds.clone();

    let state = AppState::new(config, lock_store, store, refund_store, payments);

    // ── Step 5: Background worker ────────────────────────────────
    let scheduler = if worker_enabled {
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_refund_tasks(state.refunds.clone(), &refund_config)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Refund worker disabled");
        None
    };

    // ── Step 6: HTTP server ──────────────────────────────────────
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Cinebook server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 7: Stop background tasks ────────────────────────────
    if let Some(scheduler) = scheduler {
        match tokio::time::timeout(shutdown_grace, scheduler.shutdown()).await {
            Ok(Err(e)) => tracing::warn!("Scheduler shutdown failed: {}", e),
            Err(_) => tracing::warn!("Scheduler did not stop within {:?}", shutdown_grace),
            Ok(Ok(())) => {}
        }
    }
    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("Cinebook server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! Cron scheduler for periodic refund tasks.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use cinebook_core::config::RefundConfig;
use cinebook_core::error::AppError;
use cinebook_service::RefundCompensator;

use crate::executor::TaskHandler;
use crate::tasks::{ExhaustedRefundReportTask, RefundSweepTask};

/// Cron-based scheduler for periodic background tasks
#[derive(Clone)]
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Register the refund sweep and the exhausted-refund report
    pub async fn register_refund_tasks(
        &self,
        compensator: RefundCompensator,
        config: &RefundConfig,
    ) -> Result<(), AppError> {
        self.register(
            &config.sweep_cron,
            Arc::new(RefundSweepTask::new(compensator.clone())),
        )
        .await?;
        self.register(
            &config.report_cron,
            Arc::new(ExhaustedRefundReportTask::new(compensator)),
        )
        .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run `handler` on a six-field cron schedule. A run that is still going
    /// when the next tick fires makes that tick a no-op.
    pub async fn register(
        &self,
        schedule: &str,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), AppError> {
        let name = handler.name().to_string();
        let running = Arc::new(Mutex::new(()));

        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let handler = Arc::clone(&handler);
            let running = Arc::clone(&running);
            Box::pin(async move {
                run_guarded(handler.as_ref(), &running).await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{}' for {}: {}",
                schedule, name, e
            ))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {} schedule: {}", name, e)))?;

        tracing::info!("Registered: {} ({})", name, schedule);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

/// Run one task unless its previous run still holds `running`. Returns
/// whether the task ran.
async fn run_guarded(handler: &dyn TaskHandler, running: &Mutex<()>) -> bool {
    let Ok(_guard) = running.try_lock() else {
        tracing::debug!("Skipping {}: previous run still in progress", handler.name());
        return false;
    };

    let started = Instant::now();
    match handler.execute().await {
        Ok(summary) => {
            tracing::debug!(
                task = handler.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                summary = %summary,
                "Scheduled task finished"
            );
        }
        Err(e) => {
            tracing::error!(task = handler.name(), error = %e, "Scheduled task failed");
        }
    }
    true
}

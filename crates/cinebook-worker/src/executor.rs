//! Scheduled task trait and error type.

use async_trait::async_trait;
use serde_json::Value;

use cinebook_core::error::AppError;

/// A unit of periodic work.
#[async_trait]
pub trait TaskHandler: Send + Sync + std::fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run once and return a summary for the log.
    async fn execute(&self) -> Result<Value, TaskExecutionError>;
}

/// Error from one task run
#[derive(Debug, thiserror::Error)]
pub enum TaskExecutionError {
    /// Failure expected to clear by the next run
    #[error("Transient task failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

//! Retries queued refunds.

use async_trait::async_trait;
use serde_json::Value;

use cinebook_core::error::AppError;
use cinebook_service::RefundCompensator;

use crate::executor::{TaskExecutionError, TaskHandler};

/// Runs one sweep of the refund queue per invocation.
#[derive(Debug, Clone)]
pub struct RefundSweepTask {
    compensator: RefundCompensator,
}

impl RefundSweepTask {
    /// Create a new refund sweep task
    pub fn new(compensator: RefundCompensator) -> Self {
        Self { compensator }
    }
}

#[async_trait]
impl TaskHandler for RefundSweepTask {
    fn name(&self) -> &str {
        "refund_sweep"
    }

    async fn execute(&self) -> Result<Value, TaskExecutionError> {
        let report = self
            .compensator
            .sweep()
            .await
            .map_err(|e| TaskExecutionError::Transient(format!("Refund sweep failed: {}", e)))?;

        Ok(serde_json::to_value(report).map_err(AppError::from)?)
    }
}

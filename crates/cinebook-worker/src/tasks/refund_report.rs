//! Reports refunds that ran out of retry attempts.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::warn;

use cinebook_service::RefundCompensator;

use crate::executor::{TaskExecutionError, TaskHandler};

/// Logs every exhausted refund so an operator can settle it by hand.
#[derive(Debug, Clone)]
pub struct ExhaustedRefundReportTask {
    compensator: RefundCompensator,
}

impl ExhaustedRefundReportTask {
    /// Create a new report task
    pub fn new(compensator: RefundCompensator) -> Self {
        Self { compensator }
    }
}

#[async_trait]
impl TaskHandler for ExhaustedRefundReportTask {
    fn name(&self) -> &str {
        "exhausted_refund_report"
    }

    async fn execute(&self) -> Result<Value, TaskExecutionError> {
        let exhausted = self.compensator.exhausted().await?;
        let total_amount: i64 = exhausted.iter().map(|entry| entry.amount).sum();

        for entry in &exhausted {
            warn!(
                entry_id = %entry.id,
                payment_id = %entry.payment_id,
                booking_id = %entry.booking_id,
                amount = entry.amount,
                attempts = entry.attempts,
                last_error = entry.last_error.as_deref().unwrap_or(""),
                "Refund awaiting manual settlement"
            );
        }

        Ok(json!({
            "exhausted": exhausted.len(),
            "total_amount": total_amount,
        }))
    }
}

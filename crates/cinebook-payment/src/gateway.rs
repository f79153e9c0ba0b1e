//! Payment gateway contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeReceipt {
    /// Processor-assigned payment id.
    pub payment_id: String,
    /// Processor status string.
    pub status: String,
}

/// Result of a successful refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// Processor-assigned refund id.
    pub refund_id: String,
    /// Processor status string.
    pub status: String,
}

/// Failures reported by a gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The processor refused the operation.
    #[error("declined: {0}")]
    Declined(String),
    /// The processor could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
    /// The processor answered with something unreadable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A remote payment processor. Failures are errors, never partial states.
#[async_trait]
pub trait PaymentGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Charge `amount` minor units against `source`.
    async fn charge(&self, amount: i64, source: &str) -> Result<ChargeReceipt, GatewayError>;

    /// Refund `amount` minor units of an earlier charge.
    async fn refund(&self, payment_id: &str, amount: i64) -> Result<RefundReceipt, GatewayError>;
}

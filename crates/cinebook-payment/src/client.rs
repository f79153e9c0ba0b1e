//! Payment client used by the booking flow.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use cinebook_core::config::PaymentConfig;
use cinebook_core::error::AppError;
use cinebook_core::result::AppResult;

use crate::breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerError};
use crate::gateway::{ChargeReceipt, GatewayError, PaymentGateway, RefundReceipt};
use crate::http::HttpPaymentGateway;
use crate::mock::MockPaymentGateway;

/// Gateway wrapped by one breaker for charges and another for refunds.
///
/// Cloning shares the breakers, so every clone sees the same circuit state.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    gateway: Arc<dyn PaymentGateway>,
    charge_breaker: CircuitBreaker,
    refund_breaker: CircuitBreaker,
}

impl PaymentClient {
    /// Wrap an existing gateway.
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: &PaymentConfig) -> Self {
        Self {
            gateway,
            charge_breaker: CircuitBreaker::new("charge", config.charge.clone()),
            refund_breaker: CircuitBreaker::new("refund", config.refund.clone()),
        }
    }

    /// Build the gateway named by `payment.provider`.
    pub fn from_config(config: &PaymentConfig) -> AppResult<Self> {
        let gateway: Arc<dyn PaymentGateway> = match config.provider.as_str() {
            "mock" => {
                info!(
                    failure_rate = config.mock_failure_rate,
                    latency_ms = config.mock_latency_ms,
                    "Initializing mock payment gateway"
                );
                Arc::new(MockPaymentGateway::new(
                    config.mock_failure_rate,
                    Duration::from_millis(config.mock_latency_ms),
                ))
            }
            "http" => {
                info!(base_url = %config.base_url, "Initializing HTTP payment gateway");
                Arc::new(HttpPaymentGateway::new(config)?)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown payment provider: '{other}'. Supported: mock, http"
                )));
            }
        };
        Ok(Self::new(gateway, config))
    }

    /// Charge `amount` minor units against `source`.
    ///
    /// Breaker rejections, timeouts and declines all surface as
    /// `ErrorKind::Payment`; only the log line tells them apart.
    pub async fn charge(&self, amount: i64, source: &str) -> AppResult<ChargeReceipt> {
        let gateway = Arc::clone(&self.gateway);
        let result = self
            .charge_breaker
            .call(|| async move { gateway.charge(amount, source).await })
            .await;

        match result {
            Ok(receipt) => {
                info!(payment_id = %receipt.payment_id, amount, "Payment charged");
                Ok(receipt)
            }
            Err(err) => {
                log_failure(self.charge_breaker.name(), amount, &err);
                Err(AppError::payment("Payment did not succeed"))
            }
        }
    }

    /// Refund `amount` minor units of `payment_id`.
    ///
    /// An open refund circuit surfaces as `ErrorKind::ServiceUnavailable`,
    /// since the gateway was never contacted; every other failure is
    /// `ErrorKind::Payment`.
    pub async fn refund(&self, payment_id: &str, amount: i64) -> AppResult<RefundReceipt> {
        let gateway = Arc::clone(&self.gateway);
        let result = self
            .refund_breaker
            .call(|| async move { gateway.refund(payment_id, amount).await })
            .await;

        match result {
            Ok(receipt) => {
                info!(payment_id, refund_id = %receipt.refund_id, amount, "Payment refunded");
                Ok(receipt)
            }
            Err(CircuitBreakerError::Open) => {
                log_failure(self.refund_breaker.name(), amount, &CircuitBreakerError::Open);
                Err(AppError::service_unavailable("Refund gateway unavailable (circuit open)"))
            }
            Err(err) => {
                log_failure(self.refund_breaker.name(), amount, &err);
                Err(AppError::payment(format!(
                    "Refund of payment {payment_id} did not succeed"
                )))
            }
        }
    }

    /// Snapshots of both breakers.
    pub fn breakers(&self) -> Vec<BreakerSnapshot> {
        vec![self.charge_breaker.snapshot(), self.refund_breaker.snapshot()]
    }
}

fn log_failure(breaker: &str, amount: i64, err: &CircuitBreakerError<GatewayError>) {
    match err {
        CircuitBreakerError::Open => {
            warn!(breaker, amount, reason = "circuit_open", "Payment gateway unavailable (circuit open)");
        }
        CircuitBreakerError::Timeout(after) => {
            warn!(breaker, amount, reason = "timeout", timeout_ms = after.as_millis() as u64, "Payment gateway call timed out");
        }
        CircuitBreakerError::Inner(GatewayError::Declined(detail)) => {
            warn!(breaker, amount, reason = "declined", detail = %detail, "Payment declined by gateway");
        }
        CircuitBreakerError::Inner(other) => {
            warn!(breaker, amount, reason = "gateway_error", error = %other, "Payment gateway call failed");
        }
    }
}

//! In-process payment gateway.
//!
//! In random mode each call sleeps for the configured latency and fails with
//! the configured probability. Scripted outcomes, when queued, take
//! precedence and make the gateway deterministic for tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::gateway::{ChargeReceipt, GatewayError, PaymentGateway, RefundReceipt};

/// A queued result for the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Call succeeds.
    Succeed,
    /// Call is declined.
    Decline,
    /// Call sleeps before succeeding.
    Hang(Duration),
}

/// A charge the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCharge {
    /// Issued payment id.
    pub payment_id: String,
    /// Charged amount.
    pub amount: i64,
    /// Payment source token.
    pub source: String,
}

/// A refund the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRefund {
    /// Issued refund id.
    pub refund_id: String,
    /// Refunded payment.
    pub payment_id: String,
    /// Refunded amount.
    pub amount: i64,
}

#[derive(Debug, Default)]
struct MockState {
    charge_script: VecDeque<MockOutcome>,
    refund_script: VecDeque<MockOutcome>,
    charges: Vec<RecordedCharge>,
    refunds: Vec<RecordedRefund>,
    charge_attempts: usize,
    refund_attempts: usize,
}

/// Mock gateway issuing `pay_<uuid>` and `ref_<uuid>` ids.
#[derive(Debug)]
pub struct MockPaymentGateway {
    failure_rate: f64,
    latency: Duration,
    state: Mutex<MockState>,
}

impl MockPaymentGateway {
    /// Random-failure gateway.
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Gateway that always succeeds immediately unless scripted otherwise.
    pub fn reliable() -> Self {
        Self::new(0.0, Duration::ZERO)
    }

    /// Queue outcomes for upcoming charges.
    pub async fn script_charges(&self, outcomes: impl IntoIterator<Item = MockOutcome>) {
        self.state.lock().await.charge_script.extend(outcomes);
    }

    /// Queue outcomes for upcoming refunds.
    pub async fn script_refunds(&self, outcomes: impl IntoIterator<Item = MockOutcome>) {
        self.state.lock().await.refund_script.extend(outcomes);
    }

    /// Charges accepted so far.
    pub async fn charges(&self) -> Vec<RecordedCharge> {
        self.state.lock().await.charges.clone()
    }

    /// Refunds accepted so far.
    pub async fn refunds(&self) -> Vec<RecordedRefund> {
        self.state.lock().await.refunds.clone()
    }

    /// Charge calls that reached the gateway, successful or not.
    pub async fn charge_attempts(&self) -> usize {
        self.state.lock().await.charge_attempts
    }

    /// Refund calls that reached the gateway, successful or not.
    pub async fn refund_attempts(&self) -> usize {
        self.state.lock().await.refund_attempts
    }

    async fn resolve(&self, scripted: Option<MockOutcome>) -> Result<(), GatewayError> {
        match scripted {
            Some(MockOutcome::Succeed) => Ok(()),
            Some(MockOutcome::Decline) => Err(GatewayError::Declined("scripted decline".into())),
            Some(MockOutcome::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => {
                if !self.latency.is_zero() {
                    tokio::time::sleep(self.latency).await;
                }
                if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
                    Err(GatewayError::Transport("simulated gateway timeout".into()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, amount: i64, source: &str) -> Result<ChargeReceipt, GatewayError> {
        let scripted = {
            let mut state = self.state.lock().await;
            state.charge_attempts += 1;
            state.charge_script.pop_front()
        };
        self.resolve(scripted).await?;

        let payment_id = format!("pay_{}", Uuid::new_v4().simple());
        self.state.lock().await.charges.push(RecordedCharge {
            payment_id: payment_id.clone(),
            amount,
            source: source.to_string(),
        });

        Ok(ChargeReceipt {
            payment_id,
            status: "succeeded".to_string(),
        })
    }

    async fn refund(&self, payment_id: &str, amount: i64) -> Result<RefundReceipt, GatewayError> {
        let scripted = {
            let mut state = self.state.lock().await;
            state.refund_attempts += 1;
            state.refund_script.pop_front()
        };
        self.resolve(scripted).await?;

        let refund_id = format!("ref_{}", Uuid::new_v4().simple());
        self.state.lock().await.refunds.push(RecordedRefund {
            refund_id: refund_id.clone(),
            payment_id: payment_id.to_string(),
            amount,
        });

        Ok(RefundReceipt {
            refund_id,
            status: "succeeded".to_string(),
        })
    }
}

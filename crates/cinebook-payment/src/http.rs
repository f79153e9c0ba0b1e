//! JSON-over-HTTP payment gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cinebook_core::config::PaymentConfig;
use cinebook_core::error::AppError;

use crate::gateway::{ChargeReceipt, GatewayError, PaymentGateway, RefundReceipt};

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    amount: i64,
    source: &'a str,
}

#[derive(Debug, Serialize)]
struct RefundRequest<'a> {
    payment_id: &'a str,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct ProcessorResponse {
    id: String,
    status: String,
}

/// Gateway posting to `{base_url}/charges` and `{base_url}/refunds`.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    /// Build a gateway client. The breaker enforces call timeouts, so the
    /// HTTP client only bounds connection setup.
    pub fn new(config: &PaymentConfig) -> Result<Self, AppError> {
        if config.base_url.is_empty() {
            return Err(AppError::configuration(
                "payment.base_url is required for the http provider",
            ));
        }

        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ProcessorResponse, GatewayError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Calling payment processor");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Declined(format!("{status}: {text}")));
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(format!("processor returned {status}")));
        }

        let parsed: ProcessorResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if parsed.status != "succeeded" {
            return Err(GatewayError::Declined(format!(
                "processor status '{}'",
                parsed.status
            )));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, amount: i64, source: &str) -> Result<ChargeReceipt, GatewayError> {
        let response = self
            .post("/charges", &ChargeRequest { amount, source })
            .await?;
        Ok(ChargeReceipt {
            payment_id: response.id,
            status: response.status,
        })
    }

    async fn refund(&self, payment_id: &str, amount: i64) -> Result<RefundReceipt, GatewayError> {
        let response = self
            .post("/refunds", &RefundRequest { payment_id, amount })
            .await?;
        Ok(RefundReceipt {
            refund_id: response.id,
            status: response.status,
        })
    }
}

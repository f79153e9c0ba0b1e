//! Payment gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Payment gateway and circuit breaker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Gateway provider: `"mock"` or `"http"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the HTTP gateway.
    #[serde(default)]
    pub base_url: String,
    /// API key sent as a bearer token to the HTTP gateway.
    #[serde(default)]
    pub api_key: String,
    /// Fraction of mock calls that fail, between 0.0 and 1.0.
    #[serde(default = "default_mock_failure_rate")]
    pub mock_failure_rate: f64,
    /// Simulated mock gateway latency in milliseconds.
    #[serde(default = "default_mock_latency")]
    pub mock_latency_ms: u64,
    /// Breaker guarding charges.
    #[serde(default = "BreakerSettings::charge")]
    pub charge: BreakerSettings,
    /// Breaker guarding refunds.
    #[serde(default = "BreakerSettings::refund")]
    pub refund: BreakerSettings,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: String::new(),
            api_key: String::new(),
            mock_failure_rate: default_mock_failure_rate(),
            mock_latency_ms: default_mock_latency(),
            charge: BreakerSettings::charge(),
            refund: BreakerSettings::refund(),
        }
    }
}

/// Circuit breaker tuning for one downstream operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerSettings {
    /// Per-call timeout in milliseconds; a timeout counts as a failure.
    pub call_timeout_ms: u64,
    /// Failure percentage in the rolling window that opens the circuit.
    #[serde(default = "default_threshold")]
    pub error_threshold_percentage: u8,
    /// Minimum calls in the window before the ratio is evaluated.
    #[serde(default = "default_volume")]
    pub volume_threshold: u32,
    /// How long the circuit stays open, in milliseconds.
    pub reset_timeout_ms: u64,
    /// Length of the rolling statistics window in milliseconds.
    #[serde(default = "default_window")]
    pub rolling_window_ms: u64,
    /// Concurrent trial calls admitted while half-open.
    #[serde(default = "default_half_open_calls")]
    pub half_open_max_calls: u32,
}

impl BreakerSettings {
    /// Defaults for the charge path: 5s timeout, 10s reset.
    pub fn charge() -> Self {
        Self {
            call_timeout_ms: 5_000,
            error_threshold_percentage: default_threshold(),
            volume_threshold: default_volume(),
            reset_timeout_ms: 10_000,
            rolling_window_ms: default_window(),
            half_open_max_calls: default_half_open_calls(),
        }
    }

    /// Defaults for the refund path: 10s timeout, 30s reset.
    pub fn refund() -> Self {
        Self {
            call_timeout_ms: 10_000,
            reset_timeout_ms: 30_000,
            ..Self::charge()
        }
    }

    /// Per-call timeout as a [`Duration`].
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Open-state duration as a [`Duration`].
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    /// Rolling window length as a [`Duration`].
    pub fn rolling_window(&self) -> Duration {
        Duration::from_millis(self.rolling_window_ms)
    }
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_mock_failure_rate() -> f64 {
    0.1
}

fn default_mock_latency() -> u64 {
    100
}

fn default_threshold() -> u8 {
    50
}

fn default_volume() -> u32 {
    5
}

fn default_window() -> u64 {
    10_000
}

fn default_half_open_calls() -> u32 {
    1
}

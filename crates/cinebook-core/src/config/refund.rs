//! Refund queue configuration.

use serde::{Deserialize, Serialize};

/// Settings for the durable refund queue and its sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundConfig {
    /// Attempts before an entry is left for manual handling.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Cron expression (with seconds) for the retry sweep.
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Cron expression for the exhausted-refund report.
    #[serde(default = "default_report_cron")]
    pub report_cron: String,
    /// Lease in seconds for an entry claimed by a sweep.
    #[serde(default = "default_lease")]
    pub claim_lease_seconds: i64,
    /// Maximum entries processed per sweep.
    #[serde(default = "default_batch")]
    pub batch_size: i64,
}

impl Default for RefundConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            sweep_cron: default_sweep_cron(),
            report_cron: default_report_cron(),
            claim_lease_seconds: default_lease(),
            batch_size: default_batch(),
        }
    }
}

fn default_max_attempts() -> i32 {
    3
}

fn default_sweep_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_report_cron() -> String {
    "0 0 * * * *".to_string()
}

fn default_lease() -> i64 {
    120
}

fn default_batch() -> i64 {
    50
}

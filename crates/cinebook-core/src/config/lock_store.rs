//! Lock store configuration.

use serde::{Deserialize, Serialize};

/// Seat lock store configuration.
///
/// The same store also holds idempotency records and rate-limit counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockStoreConfig {
    /// Provider type: `"redis"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis backend configuration.
    #[serde(default)]
    pub redis: RedisConfig,
}

impl Default for LockStoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Optional prefix prepended to every key, for sharing one Redis
    /// between deployments.
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: String::new(),
        }
    }
}

fn default_provider() -> String {
    "redis".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

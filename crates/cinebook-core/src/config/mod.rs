//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a default, so an empty file yields a
//! runnable development setup.

pub mod auth;
pub mod booking;
pub mod database;
pub mod lock_store;
pub mod logging;
pub mod payment;
pub mod rate_limit;
pub mod refund;
pub mod server;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::booking::BookingConfig;
pub use self::database::DatabaseConfig;
pub use self::lock_store::{LockStoreConfig, RedisConfig};
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::payment::{BreakerSettings, PaymentConfig};
pub use self::rate_limit::RateLimitConfig;
pub use self::refund::RefundConfig;
pub use self::server::{CorsConfig, ServerConfig};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Transactional store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Seat lock store settings.
    #[serde(default)]
    pub lock_store: LockStoreConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Seat locking and cancellation policy.
    #[serde(default)]
    pub booking: BookingConfig,
    /// Payment gateway and circuit breaker settings.
    #[serde(default)]
    pub payment: PaymentConfig,
    /// Refund queue settings.
    #[serde(default)]
    pub refunds: RefundConfig,
    /// Per-user request limits.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CINEBOOK_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CINEBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

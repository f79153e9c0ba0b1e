//! Lock store manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use cinebook_core::config::LockStoreConfig;
use cinebook_core::error::AppError;
use cinebook_core::result::AppResult;
use cinebook_core::traits::LockStore;

/// Wraps the lock store provider selected at construction time.
#[derive(Debug, Clone)]
pub struct LockStoreManager {
    inner: Arc<dyn LockStore>,
}

impl LockStoreManager {
    /// Create a new manager from configuration.
    pub async fn new(config: &LockStoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn LockStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis lock store");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisLockStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory lock store");
                Arc::new(crate::memory::MemoryLockStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown lock store provider: '{other}'. Supported: redis, memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn LockStore>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl LockStore for LockStoreManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.set_nx(key, value, ttl).await
    }

    async fn set_nx_batch(
        &self,
        keys: &[String],
        value: &str,
        ttl: Duration,
    ) -> AppResult<Vec<bool>> {
        self.inner.set_nx_batch(keys, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.inner.delete(key).await
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<u64> {
        self.inner.delete_many(keys).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn ttl(&self, key: &str) -> AppResult<i64> {
        self.inner.ttl(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.inner.expire(key, ttl).await
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        self.inner.incr(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

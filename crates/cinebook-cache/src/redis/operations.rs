//! Redis lock store implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use cinebook_core::error::{AppError, ErrorKind};
use cinebook_core::result::AppResult;
use cinebook_core::traits::LockStore;

use super::client::RedisClient;

/// Redis-backed lock store.
#[derive(Debug, Clone)]
pub struct RedisLockStore {
    client: RedisClient,
}

impl RedisLockStore {
    /// Create a new Redis lock store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }

    /// Redis rejects `EX 0`; clamp to one second.
    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        conn.get(&full_key).await.map_err(Self::map_err)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        let _: () = conn
            .set_ex(&full_key, value, Self::ttl_secs(ttl))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();

        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(value)
            .arg("EX")
            .arg(Self::ttl_secs(ttl))
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result.is_some())
    }

    async fn set_nx_batch(
        &self,
        keys: &[String],
        value: &str,
        ttl: Duration,
    ) -> AppResult<Vec<bool>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in keys {
            pipe.cmd("SET")
                .arg(self.client.key(key))
                .arg(value)
                .arg("EX")
                .arg(Self::ttl_secs(ttl))
                .arg("NX");
        }

        let mut conn = self.client.connection();
        let results: Vec<Option<String>> =
            pipe.query_async(&mut conn).await.map_err(Self::map_err)?;

        debug!(
            requested = keys.len(),
            created = results.iter().filter(|r| r.is_some()).count(),
            "Batched SET NX"
        );
        Ok(results.into_iter().map(|r| r.is_some()).collect())
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        let removed: u64 = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(removed > 0)
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let full_keys: Vec<String> = keys.iter().map(|k| self.client.key(k)).collect();
        let mut conn = self.client.connection();
        conn.del(&full_keys).await.map_err(Self::map_err)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        conn.exists(&full_key).await.map_err(Self::map_err)
    }

    async fn ttl(&self, key: &str) -> AppResult<i64> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        redis::cmd("TTL")
            .arg(&full_key)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        let updated: i64 = redis::cmd("EXPIRE")
            .arg(&full_key)
            .arg(Self::ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(updated == 1)
    }

    async fn incr(&self, key: &str) -> AppResult<i64> {
        let full_key = self.client.key(key);
        let mut conn = self.client.connection();
        conn.incr(&full_key, 1i64).await.map_err(Self::map_err)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.connection();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}

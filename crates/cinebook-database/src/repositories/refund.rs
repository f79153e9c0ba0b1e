//! Queued refund repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use cinebook_core::error::{AppError, ErrorKind};
use cinebook_core::result::AppResult;
use cinebook_core::types::id::{BookingId, RefundEntryId};
use cinebook_entity::refund::{CreateQueuedRefund, QueuedRefund};

use crate::store::RefundStore;

/// Durable refund queue backed by the `queued_refunds` table.
#[derive(Debug, Clone)]
pub struct RefundRepository {
    pool: PgPool,
}

impl RefundRepository {
    /// Create a new refund repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefundStore for RefundRepository {
    async fn enqueue(&self, data: CreateQueuedRefund) -> AppResult<QueuedRefund> {
        sqlx::query_as::<_, QueuedRefund>(
            "INSERT INTO queued_refunds (id, payment_id, amount, booking_id, user_id, reason) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(RefundEntryId::new())
        .bind(&data.payment_id)
        .bind(data.amount)
        .bind(data.booking_id)
        .bind(data.user_id)
        .bind(&data.reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to queue refund", e))
    }

    async fn claim_due(
        &self,
        max_attempts: i32,
        lease_seconds: i64,
        limit: i64,
    ) -> AppResult<Vec<QueuedRefund>> {
        sqlx::query_as::<_, QueuedRefund>(
            "UPDATE queued_refunds \
             SET locked_until = NOW() + make_interval(secs => $2::double precision), \
                 updated_at = NOW() \
             WHERE id IN ( \
                SELECT id FROM queued_refunds \
                WHERE attempts < $1 AND (locked_until IS NULL OR locked_until < NOW()) \
                ORDER BY created_at ASC \
                LIMIT $3 \
                FOR UPDATE SKIP LOCKED \
             ) RETURNING *",
        )
        .bind(max_attempts)
        .bind(lease_seconds as f64)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim refunds", e))
    }

    async fn remove(&self, id: RefundEntryId) -> AppResult<()> {
        sqlx::query("DELETE FROM queued_refunds WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove refund", e))?;
        Ok(())
    }

    async fn record_failure(&self, id: RefundEntryId, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE queued_refunds SET attempts = attempts + 1, last_error = $2, \
             last_attempt_at = NOW(), locked_until = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record refund attempt", e)
        })?;
        Ok(())
    }

    async fn release(&self, id: RefundEntryId) -> AppResult<()> {
        sqlx::query("UPDATE queued_refunds SET locked_until = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to release refund claim", e)
            })?;
        Ok(())
    }

    async fn find_pending(&self, max_attempts: i32) -> AppResult<Vec<QueuedRefund>> {
        sqlx::query_as::<_, QueuedRefund>(
            "SELECT * FROM queued_refunds WHERE attempts < $1 ORDER BY created_at ASC",
        )
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list refunds", e))
    }

    async fn find_exhausted(&self, max_attempts: i32) -> AppResult<Vec<QueuedRefund>> {
        sqlx::query_as::<_, QueuedRefund>(
            "SELECT * FROM queued_refunds WHERE attempts >= $1 ORDER BY created_at ASC",
        )
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list refunds", e))
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> AppResult<Vec<QueuedRefund>> {
        sqlx::query_as::<_, QueuedRefund>(
            "SELECT * FROM queued_refunds WHERE booking_id = $1 ORDER BY created_at ASC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list refunds", e))
    }
}

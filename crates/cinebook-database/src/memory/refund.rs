//! In-memory refund queue.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use cinebook_core::result::AppResult;
use cinebook_core::types::id::{BookingId, RefundEntryId};
use cinebook_entity::refund::{CreateQueuedRefund, QueuedRefund};

use crate::store::RefundStore;

/// [`RefundStore`] held in process memory, in enqueue order.
#[derive(Debug, Clone, Default)]
pub struct MemoryRefundStore {
    entries: Arc<Mutex<Vec<QueuedRefund>>>,
}

impl MemoryRefundStore {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, regardless of state.
    pub async fn all(&self) -> Vec<QueuedRefund> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl RefundStore for MemoryRefundStore {
    async fn enqueue(&self, data: CreateQueuedRefund) -> AppResult<QueuedRefund> {
        let entry = data.into_entry(Utc::now());
        self.entries.lock().await.push(entry.clone());
        Ok(entry)
    }

    async fn claim_due(
        &self,
        max_attempts: i32,
        lease_seconds: i64,
        limit: i64,
    ) -> AppResult<Vec<QueuedRefund>> {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let mut claimed = Vec::new();
        for entry in entries.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            let free = entry.locked_until.is_none_or(|until| until < now);
            if entry.attempts < max_attempts && free {
                entry.locked_until = Some(now + Duration::seconds(lease_seconds));
                entry.updated_at = now;
                claimed.push(entry.clone());
            }
        }
        Ok(claimed)
    }

    async fn remove(&self, id: RefundEntryId) -> AppResult<()> {
        self.entries.lock().await.retain(|e| e.id != id);
        Ok(())
    }

    async fn record_failure(&self, id: RefundEntryId, error: &str) -> AppResult<()> {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            entry.attempts += 1;
            entry.last_error = Some(error.to_string());
            entry.last_attempt_at = Some(now);
            entry.locked_until = None;
            entry.updated_at = now;
        }
        Ok(())
    }


    async fn release(&self, id: RefundEntryId) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            entry.locked_until = None;
        }
        Ok(())
    }
    async fn find_pending(&self, max_attempts: i32) -> AppResult<Vec<QueuedRefund>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| e.attempts < max_attempts)
            .cloned()
            .collect())
    }

    async fn find_exhausted(&self, max_attempts: i32) -> AppResult<Vec<QueuedRefund>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| e.is_exhausted(max_attempts))
            .cloned()
            .collect())
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> AppResult<Vec<QueuedRefund>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| e.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

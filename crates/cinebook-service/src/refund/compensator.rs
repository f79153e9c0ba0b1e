//! Refund Compensator.
//!
//! Refunds that cannot be issued synchronously go to the durable refund
//! queue. A periodic sweep retries them until they succeed or run out of
//! attempts; exhausted entries stay in the queue for operators.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use cinebook_core::config::RefundConfig;
use cinebook_core::error::{AppError, ErrorKind};
use cinebook_core::types::id::{BookingId, RefundEntryId, UserId};
use cinebook_database::{BookingStore, RefundStore};
use cinebook_entity::refund::{CreateQueuedRefund, QueuedRefund};
use cinebook_payment::PaymentClient;

/// Outcome of [`RefundCompensator::refund_or_enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundAttempt {
    /// The gateway refunded immediately.
    Refunded {
        /// Gateway refund id.
        refund_id: String,
    },
    /// The refund was queued for the sweep.
    Queued {
        /// Queue entry id.
        entry_id: RefundEntryId,
    },
}

/// Counters from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries claimed.
    pub claimed: usize,
    /// Entries refunded and removed.
    pub refunded: usize,
    /// Entries whose attempt failed.
    pub failed: usize,
    /// Failed entries that have now used their last attempt.
    pub exhausted: usize,
    /// Entries left untouched because the refund circuit was open.
    pub deferred: usize,
}

/// Issues refunds and drives the retry queue.
#[derive(Debug, Clone)]
pub struct RefundCompensator {
    /// Durable retry queue.
    refunds: Arc<dyn RefundStore>,
    /// Booking store, to record refund ids.
    store: Arc<dyn BookingStore>,
    /// Payment client with its refund breaker.
    payments: PaymentClient,
    /// Queue settings.
    config: RefundConfig,
}

impl RefundCompensator {
    /// Creates a new refund compensator.
    pub fn new(
        refunds: Arc<dyn RefundStore>,
        store: Arc<dyn BookingStore>,
        payments: PaymentClient,
        config: RefundConfig,
    ) -> Self {
        Self {
            refunds,
            store,
            payments,
            config,
        }
    }

    /// Attempts allowed per entry.
    pub fn max_attempts(&self) -> i32 {
        self.config.max_attempts
    }

    /// Queue a refund with zero attempts.
    pub async fn enqueue(&self, data: CreateQueuedRefund) -> Result<QueuedRefund, AppError> {
        let entry = self.refunds.enqueue(data).await?;
        info!(
            entry_id = %entry.id,
            payment_id = %entry.payment_id,
            booking_id = %entry.booking_id,
            amount = entry.amount,
            reason = %entry.reason,
            "Refund queued"
        );
        Ok(entry)
    }

    /// Refund now; on any failure, queue it instead.
    ///
    /// Errors only if the queue itself could not be written.
    pub async fn refund_or_enqueue(
        &self,
        payment_id: &str,
        amount: i64,
        booking_id: BookingId,
        user_id: UserId,
        reason: &str,
    ) -> Result<RefundAttempt, AppError> {
        match self.payments.refund(payment_id, amount).await {
            Ok(receipt) => {
                self.record_refund_id(booking_id, &receipt.refund_id).await;
                Ok(RefundAttempt::Refunded {
                    refund_id: receipt.refund_id,
                })
            }
            Err(e) => {
                warn!(
                    payment_id,
                    booking_id = %booking_id,
                    error = %e,
                    "Immediate refund failed, queuing"
                );
                let entry = self
                    .enqueue(CreateQueuedRefund {
                        payment_id: payment_id.to_string(),
                        amount,
                        booking_id,
                        user_id,
                        reason: reason.to_string(),
                    })
                    .await?;
                Ok(RefundAttempt::Queued { entry_id: entry.id })
            }
        }
    }

    /// Retry every due entry once.
    ///
    /// Per-entry bookkeeping failures are logged and skipped; the entry's
    /// lease expires and a later sweep picks it up again. An open refund
    /// circuit ends the sweep early; the remaining entries keep their
    /// attempt counts.
    pub async fn sweep(&self) -> Result<SweepReport, AppError> {
        let claimed = self
            .refunds
            .claim_due(
                self.config.max_attempts,
                self.config.claim_lease_seconds,
                self.config.batch_size,
            )
            .await?;

        let mut report = SweepReport {
            claimed: claimed.len(),
            ..SweepReport::default()
        };

        let mut entries = claimed.into_iter();
        while let Some(entry) = entries.next() {
            let outcome = self.payments.refund(&entry.payment_id, entry.amount).await;
            match outcome {
                Ok(receipt) => {
                    if let Err(e) = self.refunds.remove(entry.id).await {
                        error!(entry_id = %entry.id, error = %e, "Failed to remove refunded entry");
                        continue;
                    }
                    self.record_refund_id(entry.booking_id, &receipt.refund_id)
                        .await;
                    report.refunded += 1;
                }
                Err(e) if e.kind == ErrorKind::ServiceUnavailable => {
                    let deferred: Vec<_> = std::iter::once(entry).chain(entries.by_ref()).collect();
                    report.deferred = deferred.len();
                    for entry in deferred {
                        if let Err(store_err) = self.refunds.release(entry.id).await {
                            warn!(entry_id = %entry.id, error = %store_err, "Failed to release refund claim");
                        }
                    }
                    warn!(deferred = report.deferred, "Refund circuit open; sweep stopped early");
                    break;
                }
                Err(e) => {
                    if let Err(store_err) = self.refunds.record_failure(entry.id, &e.message).await {
                        error!(entry_id = %entry.id, error = %store_err, "Failed to record refund failure");
                        continue;
                    }
                    report.failed += 1;

                    let attempts = entry.attempts + 1;
                    if attempts >= self.config.max_attempts {
                        report.exhausted += 1;
                        warn!(
                            entry_id = %entry.id,
                            payment_id = %entry.payment_id,
                            booking_id = %entry.booking_id,
                            amount = entry.amount,
                            attempts,
                            "Refund exhausted its retry attempts; manual action required"
                        );
                    }
                }
            }
        }

        if report.claimed > 0 {
            info!(
                claimed = report.claimed,
                refunded = report.refunded,
                failed = report.failed,
                exhausted = report.exhausted,
                deferred = report.deferred,
                "Refund sweep finished"
            );
        }
        Ok(report)
    }

    /// Entries that still have attempts left.
    pub async fn pending(&self) -> Result<Vec<QueuedRefund>, AppError> {
        self.refunds.find_pending(self.config.max_attempts).await
    }

    /// Entries that used up their attempts.
    pub async fn exhausted(&self) -> Result<Vec<QueuedRefund>, AppError> {
        self.refunds.find_exhausted(self.config.max_attempts).await
    }

    /// Entries queued for one booking.
    pub async fn for_booking(&self, booking_id: BookingId) -> Result<Vec<QueuedRefund>, AppError> {
        self.refunds.find_by_booking(booking_id).await
    }

    async fn record_refund_id(&self, booking_id: BookingId, refund_id: &str) {
        match self.store.record_refund(booking_id, refund_id).await {
            Ok(true) => {}
            // Compensation refunds reference bookings that were never written.
            Ok(false) => {}
            Err(e) => {
                warn!(booking_id = %booking_id, refund_id, error = %e, "Failed to record refund id");
            }
        }
    }
}

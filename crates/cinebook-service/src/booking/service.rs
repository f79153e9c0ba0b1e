//! Booking Transaction Coordinator.
//!
//! Confirmation runs `VALIDATING -> CHARGING -> COMMITTING -> DONE`, with a
//! compensating refund whenever a charge went through but no booking was
//! committed. Cancellation commits first and refunds afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use cinebook_core::config::BookingConfig;
use cinebook_core::error::{AppError, ErrorKind, REFUND_IN_PROGRESS, REFUND_MANUAL_REVIEW};
use cinebook_core::types::id::{BookingId, ShowId, UserId};
use cinebook_database::{BookingStore, BookingTransaction};
use cinebook_entity::booking::{Booking, CancellationTerms, CreateBooking};
use cinebook_entity::refund::CreateQueuedRefund;
use cinebook_entity::show::Show;
use cinebook_entity::user::HistoryEntry;
use cinebook_payment::PaymentClient;

use super::policy::CancellationPolicy;
use super::pricing;
use crate::context::RequestContext;
use crate::refund::{RefundAttempt, RefundCompensator};
use crate::seat::{SeatLockManager, validate_seat_selection};

/// Longest accepted cancellation reason, in characters.
pub const MAX_REASON_LENGTH: usize = 500;

/// Request to confirm (pay for and commit) a set of seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmBookingRequest {
    /// Show being booked.
    pub show_id: ShowId,
    /// Seats, in the order the customer picked them.
    pub seats: Vec<String>,
    /// Opaque payment source token.
    pub payment_token: String,
}

/// Request to cancel a booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    /// Reason supplied by the customer.
    pub reason: Option<String>,
}

/// Confirms and cancels bookings.
#[derive(Debug, Clone)]
pub struct BookingService {
    /// Transactional store.
    store: Arc<dyn BookingStore>,
    /// Seat locks, released after payment failure and after commit.
    seats: SeatLockManager,
    /// Payment client with its charge breaker.
    payments: PaymentClient,
    /// Refund path for compensations and cancellations.
    compensator: RefundCompensator,
    /// Cancellation refund tiers.
    policy: CancellationPolicy,
    /// Maximum seats per confirmation.
    max_seats: usize,
}

impl BookingService {
    /// Creates a new booking service.
    pub fn new(
        store: Arc<dyn BookingStore>,
        seats: SeatLockManager,
        payments: PaymentClient,
        compensator: RefundCompensator,
        config: &BookingConfig,
    ) -> Self {
        Self {
            store,
            seats,
            payments,
            compensator,
            policy: CancellationPolicy::from_config(config),
            max_seats: config.max_seats_per_request,
        }
    }

    /// Charge for and commit a booking.
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input or a show that already started.
    /// - `NotFound` if the show does not exist.
    /// - `Conflict` if any seat is already booked. When this is only
    ///   discovered after charging, a refund is queued and the error carries
    ///   the `payment_id`.
    /// - `Payment` if the charge did not succeed; the seat locks are released.
    /// - `Persistence` if the booking could not be committed after charging;
    ///   a refund is queued and the error carries the `payment_id`.
    ///
    /// Everything from the charge onwards runs to completion even if the
    /// returned future is dropped.
    pub async fn confirm(
        &self,
        ctx: &RequestContext,
        req: ConfirmBookingRequest,
    ) -> Result<Booking, AppError> {
        // VALIDATING
        validate_seat_selection(&req.seats, self.max_seats)?;
        if req.payment_token.trim().is_empty() {
            return Err(AppError::validation("Payment token is required"));
        }

        let show = self
            .store
            .find_show(req.show_id)
            .await?
            .ok_or_else(|| AppError::not_found("Show not found"))?;
        ensure_bookable(&show, &req.seats, Utc::now())?;

        // Once money may move, the outcome is settled on its own task so a
        // dropped request cannot strand a charge without a booking or refund.
        let service = self.clone();
        let user_id = ctx.user_id;
        tokio::spawn(async move { service.charge_and_commit(user_id, show, req).await })
            .await
            .unwrap_or_else(|e| {
                error!(user_id = %user_id, error = %e, "Booking settlement task failed");
                Err(AppError::internal("Booking settlement failed"))
            })
    }

    /// CHARGING, COMMITTING and then DONE or COMPENSATING.
    async fn charge_and_commit(
        &self,
        user_id: UserId,
        show: Show,
        req: ConfirmBookingRequest,
    ) -> Result<Booking, AppError> {
        // CHARGING
        let total_amount = self.price(&show, &req.seats).await;
        let booking_id = BookingId::new();

        let receipt = match self.payments.charge(total_amount, &req.payment_token).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.release_locks(req.show_id, &req.seats).await;
                info!(
                    user_id = %user_id,
                    show_id = %req.show_id,
                    seat_ids = ?req.seats,
                    "Booking payment failed; seat locks released"
                );
                return Err(e);
            }
        };

        // COMMITTING
        let data = CreateBooking {
            id: booking_id,
            user_id,
            show_id: req.show_id,
            seats: req.seats.clone(),
            total_amount,
            payment_id: receipt.payment_id.clone(),
        };

        match self.commit_confirmation(data).await {
            Ok(booking) => {
                // DONE
                if let Err(e) = self.seats.unlock_many(req.show_id, &req.seats).await {
                    warn!(
                        booking_id = %booking.id,
                        error = %e,
                        "Failed to unlock seats after booking; locks will expire"
                    );
                }
                info!(
                    booking_id = %booking.id,
                    user_id = %user_id,
                    show_id = %booking.show_id,
                    seat_ids = ?booking.seats,
                    payment_id = %receipt.payment_id,
                    total_amount,
                    "Booking confirmed"
                );
                Ok(booking)
            }
            Err(e) => {
                // COMPENSATING
                let err = self
                    .compensate_charge(user_id, booking_id, &receipt.payment_id, total_amount, e)
                    .await;
                self.release_locks(req.show_id, &req.seats).await;
                Err(err)
            }
        }
    }

    /// Cancel a booking owned by the caller and refund per policy.
    ///
    /// The cancellation is final once committed; a failed refund is queued
    /// and never fails the call.
    pub async fn cancel(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        req: CancelBookingRequest,
    ) -> Result<Booking, AppError> {
        let reason = req
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if let Some(reason) = &reason {
            if reason.chars().count() > MAX_REASON_LENGTH {
                return Err(AppError::validation(format!(
                    "Cancellation reason must be at most {MAX_REASON_LENGTH} characters"
                )));
            }
        }

        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let applied = self
            .apply_cancellation(tx.as_mut(), ctx.user_id, booking_id, reason, now)
            .await;
        let mut booking = match applied {
            Ok(booking) => {
                tx.commit().await?;
                booking
            }
            Err(e) => {
                rollback(tx).await;
                return Err(e);
            }
        };

        let refund_amount = booking.refund_amount.unwrap_or(0);
        info!(
            booking_id = %booking.id,
            user_id = %ctx.user_id,
            show_id = %booking.show_id,
            refund_amount,
            "Booking cancelled"
        );

        if let Some(payment_id) = booking.payment_id.clone() {
            if refund_amount > 0 {
                let reason = booking
                    .cancellation_reason
                    .clone()
                    .unwrap_or_else(|| "Customer cancellation".to_string());
                match self
                    .compensator
                    .refund_or_enqueue(&payment_id, refund_amount, booking.id, ctx.user_id, &reason)
                    .await
                {
                    Ok(RefundAttempt::Refunded { refund_id }) => {
                        booking.refund_id = Some(refund_id);
                    }
                    Ok(RefundAttempt::Queued { .. }) => {}
                    Err(e) => {
                        error!(
                            booking_id = %booking.id,
                            payment_id = %payment_id,
                            amount = refund_amount,
                            error = %e,
                            "Refund could neither be issued nor queued; manual action required"
                        );
                    }
                }
            }
        }

        Ok(booking)
    }

    async fn price(&self, show: &Show, seats: &[String]) -> i64 {
        let hall = match self.store.find_hall(show.hall_id).await {
            Ok(hall) => hall,
            Err(e) => {
                warn!(hall_id = %show.hall_id, error = %e, "Hall lookup failed; using show price");
                None
            }
        };
        pricing::total_amount(show, hall.as_ref(), seats)
    }

    async fn commit_confirmation(&self, data: CreateBooking) -> Result<Booking, AppError> {
        let mut tx = self.store.begin().await?;
        match apply_confirmation(tx.as_mut(), data, Utc::now()).await {
            Ok(booking) => {
                tx.commit().await?;
                Ok(booking)
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    async fn apply_cancellation(
        &self,
        tx: &mut dyn BookingTransaction,
        user_id: UserId,
        booking_id: BookingId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut booking = tx
            .booking_for_update(booking_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking not found"))?;

        if booking.is_cancelled() {
            return Err(AppError::conflict("Booking is already cancelled"));
        }

        let show = tx
            .show_for_update(booking.show_id)
            .await?
            .ok_or_else(|| AppError::not_found("Show not found"))?;

        let refund_amount = self
            .policy
            .refund_amount(booking.total_amount, show.hours_until_start(now))?;

        booking.cancel(&CancellationTerms {
            refund_amount,
            cancelled_at: now,
            reason,
        });
        tx.update_cancellation(&booking).await?;
        tx.remove_booked_seats(show.id, &booking.seats).await?;
        tx.pull_history(user_id, booking.id).await?;
        Ok(booking)
    }

    /// Queue a refund for a charge whose booking was not committed and build
    /// the error returned to the caller.
    async fn compensate_charge(
        &self,
        user_id: UserId,
        booking_id: BookingId,
        payment_id: &str,
        amount: i64,
        cause: AppError,
    ) -> AppError {
        let business_rejection = matches!(
            cause.kind,
            ErrorKind::Conflict | ErrorKind::Validation | ErrorKind::NotFound
        );
        let reason = if business_rejection {
            format!("Booking rejected after payment: {}", cause.message)
        } else {
            "Booking persistence failed after payment".to_string()
        };

        let queued = self
            .compensator
            .enqueue(CreateQueuedRefund {
                payment_id: payment_id.to_string(),
                amount,
                booking_id,
                user_id,
                reason,
            })
            .await;
        if let Err(e) = &queued {
            error!(
                payment_id,
                booking_id = %booking_id,
                amount,
                error = %e,
                "Failed to queue compensating refund; manual action required"
            );
        }
        let refund_queued = queued.is_ok();

        if business_rejection {
            warn!(payment_id, booking_id = %booking_id, refund_queued, error = %cause, "Booking rejected after charge");
            let details = serde_json::json!({
                "payment_id": payment_id,
                "amount": amount,
                "refund_status": if refund_queued { REFUND_IN_PROGRESS } else { REFUND_MANUAL_REVIEW },
            });
            return AppError::new(cause.kind, cause.message).with_details(details);
        }

        error!(payment_id, booking_id = %booking_id, refund_queued, error = %cause, "Booking persistence failed after charge");
        AppError::persistence_after_charge(payment_id, amount, refund_queued, cause.to_string())
    }

    async fn release_locks(&self, show_id: ShowId, seats: &[String]) {
        if let Err(e) = self.seats.unlock_many(show_id, seats).await {
            warn!(show_id = %show_id, error = %e, "Failed to release seat locks");
        }
    }
}

/// Reject a show that started or seats that are already sold.
fn ensure_bookable(show: &Show, seats: &[String], now: DateTime<Utc>) -> Result<(), AppError> {
    if show.has_started(now) {
        return Err(AppError::validation("Show has already started"));
    }
    let sold = show.already_booked(seats);
    if !sold.is_empty() {
        return Err(AppError::conflict("One or more seats are already booked")
            .with_details(serde_json::json!({ "seats": sold })));
    }
    Ok(())
}

async fn apply_confirmation(
    tx: &mut dyn BookingTransaction,
    data: CreateBooking,
    now: DateTime<Utc>,
) -> Result<Booking, AppError> {
    let show = tx
        .show_for_update(data.show_id)
        .await?
        .ok_or_else(|| AppError::not_found("Show not found"))?;

    // Authoritative double-booking check, under the show row lock.
    ensure_bookable(&show, &data.seats, now)?;

    let booking = data.into_booking(now);
    tx.insert_booking(&booking).await?;
    tx.add_booked_seats(booking.show_id, &booking.seats).await?;
    tx.push_history(&HistoryEntry {
        user_id: booking.user_id,
        booking_id: booking.id,
        show_id: booking.show_id,
        booked_at: now,
    })
    .await?;
    Ok(booking)
}

async fn rollback(tx: Box<dyn BookingTransaction>) {
    if let Err(e) = tx.rollback().await {
        debug!(error = %e, "Rollback failed; the transaction is discarded on drop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, FixtureOptions, seats};
    use cinebook_entity::booking::BookingStatus;
    use cinebook_payment::MockOutcome;

    fn confirm_request(fx: &Fixture, seat_ids: &[&str]) -> ConfirmBookingRequest {
        ConfirmBookingRequest {
            show_id: fx.show_id,
            seats: seats(seat_ids),
            payment_token: "tok_visa".into(),
        }
    }

    #[tokio::test]
    async fn test_confirm_commits_booking() {
        let fx = Fixture::new().await;
        let ctx = fx.user();
        fx.seats
            .lock_seats(fx.show_id, &seats(&["A1", "A2"]), ctx.user_id)
            .await
            .expect("lock");

        let booking = fx
            .bookings
            .confirm(&ctx, confirm_request(&fx, &["A1", "A2"]))
            .await
            .expect("confirm");

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total_amount, 2000);
        assert!(booking.payment_id.as_deref().is_some_and(|p| p.starts_with("pay_")));

        let show = fx.show().await;
        assert_eq!(show.booked_seats, seats(&["A1", "A2"]));
        assert!(!fx.seats.status(fx.show_id, "A1").await.expect("status").is_locked);

        let history = fx.store.find_history(ctx.user_id).await.expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].booking_id, booking.id);
    }

    #[tokio::test]
    async fn test_confirm_uses_seat_map_prices() {
        let fx = Fixture::new().await;
        let booking = fx
            .bookings
            .confirm(&fx.user(), confirm_request(&fx, &["A1", "V1"]))
            .await
            .expect("confirm");
        assert_eq!(booking.total_amount, 3500);
        assert_eq!(fx.gateway.charges().await[0].amount, 3500);
    }

    #[tokio::test]
    async fn test_confirm_booked_seat_is_conflict_without_charge() {
        let fx = Fixture::with_booked(&["A2"]).await;
        let err = fx
            .bookings
            .confirm(&fx.user(), confirm_request(&fx, &["A2", "A3"]))
            .await
            .expect_err("conflict");

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(fx.gateway.charge_attempts().await, 0);
    }

    #[tokio::test]
    async fn test_confirm_started_show_is_rejected() {
        let fx = Fixture::build(FixtureOptions {
            starts_in: chrono::Duration::minutes(-5),
            ..FixtureOptions::default()
        })
        .await;
        let err = fx
            .bookings
            .confirm(&fx.user(), confirm_request(&fx, &["A1"]))
            .await
            .expect_err("started");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_confirm_unknown_show() {
        let fx = Fixture::new().await;
        let mut req = confirm_request(&fx, &["A1"]);
        req.show_id = ShowId::new();
        let err = fx.bookings.confirm(&fx.user(), req).await.expect_err("missing");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_payment_failure_releases_locks() {
        let fx = Fixture::new().await;
        let ctx = fx.user();
        fx.gateway.script_charges([MockOutcome::Decline]).await;
        fx.seats
            .lock_seats(fx.show_id, &seats(&["A1", "A2"]), ctx.user_id)
            .await
            .expect("lock");

        let err = fx
            .bookings
            .confirm(&ctx, confirm_request(&fx, &["A1", "A2"]))
            .await
            .expect_err("declined");

        assert_eq!(err.kind, ErrorKind::Payment);
        assert!(!fx.seats.status(fx.show_id, "A1").await.expect("status").is_locked);
        assert!(fx.show().await.booked_seats.is_empty());
        assert!(fx.store.find_bookings_by_user(ctx.user_id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_queues_refund() {
        let fx = Fixture::build(FixtureOptions {
            failing_commit: true,
            ..FixtureOptions::default()
        })
        .await;

        let err = fx
            .bookings
            .confirm(&fx.user(), confirm_request(&fx, &["A1", "A2"]))
            .await
            .expect_err("persistence");

        assert_eq!(err.kind, ErrorKind::Persistence);
        assert!(err.message.contains("refund"));

        let charge = fx.gateway.charges().await.remove(0);
        let details = err.details.expect("details");
        assert_eq!(details["payment_id"], charge.payment_id.as_str());
        assert_eq!(details["refund_status"], "in_progress");

        let queued = fx.refund_store.all().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].payment_id, charge.payment_id);
        assert_eq!(queued[0].amount, 2000);
        assert_eq!(queued[0].attempts, 0);

        assert!(fx.show().await.booked_seats.is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_without_queue_needs_manual_review() {
        let fx = Fixture::build(FixtureOptions {
            failing_commit: true,
            refund_queue_down: true,
            ..FixtureOptions::default()
        })
        .await;

        let err = fx
            .bookings
            .confirm(&fx.user(), confirm_request(&fx, &["A1"]))
            .await
            .expect_err("persistence");

        assert_eq!(err.kind, ErrorKind::Persistence);
        assert_eq!(err.details.expect("details")["refund_status"], "manual_review");
        assert!(fx.refund_store.all().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_confirm_still_settles_its_charge() {
        let fx = Fixture::new().await;
        let ctx = fx.user();
        fx.gateway
            .script_charges([MockOutcome::Hang(std::time::Duration::from_millis(100))])
            .await;

        // Hold the store while the charge is in flight so the commit waits.
        let store = fx.store.clone();
        let holder = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let tx = store.begin().await.expect("begin");
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            drop(tx);
        });

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(300),
            fx.bookings.confirm(&ctx, confirm_request(&fx, &["A1"])),
        )
        .await;
        assert!(abandoned.is_err());
        holder.await.expect("join");

        let mut bookings = Vec::new();
        for _ in 0..20 {
            bookings = fx.store.find_bookings_by_user(ctx.user_id).await.expect("list");
            if !bookings.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let charges = fx.gateway.charges().await;
        assert_eq!(charges.len(), 1);
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].payment_id.as_deref(), Some(charges[0].payment_id.as_str()));
        assert_eq!(fx.show().await.booked_seats, seats(&["A1"]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirmations_book_once() {
        let fx = Fixture::new().await;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = fx.bookings.clone();
            let ctx = fx.user();
            let req = confirm_request(&fx, &["B1", "B2"]);
            handles.push(tokio::spawn(async move { service.confirm(&ctx, req).await }));
        }

        let mut confirmed = 0;
        for handle in handles {
            match handle.await.expect("join") {
                Ok(_) => confirmed += 1,
                Err(e) => assert_eq!(e.kind, ErrorKind::Conflict),
            }
        }

        assert_eq!(confirmed, 1);
        assert_eq!(fx.show().await.booked_seats, seats(&["B1", "B2"]));

        // Every loser that was charged before losing gets its money back.
        let charges = fx.gateway.charges().await.len();
        assert_eq!(fx.refund_store.all().await.len(), charges - 1);
    }

    #[tokio::test]
    async fn test_cancel_full_refund() {
        let fx = Fixture::build(FixtureOptions {
            starts_in: chrono::Duration::hours(30),
            ..FixtureOptions::default()
        })
        .await;
        let ctx = fx.user();
        let booking = fx
            .bookings
            .confirm(&ctx, confirm_request(&fx, &["A1", "A2"]))
            .await
            .expect("confirm");

        let cancelled = fx
            .bookings
            .cancel(&ctx, booking.id, CancelBookingRequest::default())
            .await
            .expect("cancel");

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.refund_amount, Some(2000));
        assert_eq!(cancelled.seats, booking.seats);
        assert!(cancelled.refund_id.is_some());
        assert!(fx.show().await.booked_seats.is_empty());
        assert!(fx.store.find_history(ctx.user_id).await.expect("history").is_empty());

        let stored = fx.store.find_booking(booking.id).await.expect("find").expect("exists");
        assert_eq!(stored.refund_id, cancelled.refund_id);
    }

    #[tokio::test]
    async fn test_cancel_half_refund() {
        let fx = Fixture::build(FixtureOptions {
            starts_in: chrono::Duration::hours(10),
            ..FixtureOptions::default()
        })
        .await;
        let ctx = fx.user();
        let booking = fx
            .bookings
            .confirm(&ctx, confirm_request(&fx, &["A1", "A2", "A3"]))
            .await
            .expect("confirm");

        let cancelled = fx
            .bookings
            .cancel(&ctx, booking.id, CancelBookingRequest::default())
            .await
            .expect("cancel");
        assert_eq!(cancelled.refund_amount, Some(1500));
        assert_eq!(fx.gateway.refunds().await[0].amount, 1500);
    }

    #[tokio::test]
    async fn test_cancel_too_late_keeps_booking() {
        let fx = Fixture::build(FixtureOptions {
            starts_in: chrono::Duration::hours(1),
            ..FixtureOptions::default()
        })
        .await;
        let ctx = fx.user();
        let booking = fx
            .bookings
            .confirm(&ctx, confirm_request(&fx, &["A1"]))
            .await
            .expect("confirm");

        let err = fx
            .bookings
            .cancel(&ctx, booking.id, CancelBookingRequest::default())
            .await
            .expect_err("policy");
        assert_eq!(err.kind, ErrorKind::Policy);

        let stored = fx.store.find_booking(booking.id).await.expect("find").expect("exists");
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(fx.show().await.booked_seats, seats(&["A1"]));
    }

    #[tokio::test]
    async fn test_cancel_twice_is_conflict() {
        let fx = Fixture::new().await;
        let ctx = fx.user();
        let booking = fx
            .bookings
            .confirm(&ctx, confirm_request(&fx, &["A1"]))
            .await
            .expect("confirm");
        fx.bookings
            .cancel(&ctx, booking.id, CancelBookingRequest::default())
            .await
            .expect("cancel");

        let err = fx
            .bookings
            .cancel(&ctx, booking.id, CancelBookingRequest::default())
            .await
            .expect_err("already");
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_cancel_other_users_booking_is_not_found() {
        let fx = Fixture::new().await;
        let booking = fx
            .bookings
            .confirm(&fx.user(), confirm_request(&fx, &["A1"]))
            .await
            .expect("confirm");

        let err = fx
            .bookings
            .cancel(&fx.user(), booking.id, CancelBookingRequest::default())
            .await
            .expect_err("not owner");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_refund_failure_queues_and_succeeds() {
        let fx = Fixture::new().await;
        let ctx = fx.user();
        fx.gateway.script_refunds([MockOutcome::Decline]).await;
        let booking = fx
            .bookings
            .confirm(&ctx, confirm_request(&fx, &["A1"]))
            .await
            .expect("confirm");

        let cancelled = fx
            .bookings
            .cancel(&ctx, booking.id, CancelBookingRequest { reason: Some("Sick".into()) })
            .await
            .expect("cancel still succeeds");

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.refund_id.is_none());
        let queued = fx.refund_store.all().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].reason, "Sick");
        assert_eq!(queued[0].amount, 1000);
    }

    #[tokio::test]
    async fn test_cancel_reason_too_long() {
        let fx = Fixture::new().await;
        let err = fx
            .bookings
            .cancel(
                &fx.user(),
                BookingId::new(),
                CancelBookingRequest {
                    reason: Some("x".repeat(MAX_REASON_LENGTH + 1)),
                },
            )
            .await
            .expect_err("too long");
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}

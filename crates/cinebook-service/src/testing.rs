//! Shared fixtures for service tests.
//!
//! Everything runs against the in-memory stores and the mock gateway.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use cinebook_cache::memory::MemoryLockStore;
use cinebook_core::config::{BookingConfig, PaymentConfig, RefundConfig};
use cinebook_core::error::AppError;
use cinebook_core::result::AppResult;
use cinebook_core::types::id::{BookingId, EventId, HallId, RefundEntryId, ShowId, UserId};
use cinebook_core::types::pagination::{PageRequest, PageResponse};
use cinebook_database::memory::{MemoryBookingStore, MemoryRefundStore};
use cinebook_database::{BookingStore, BookingTransaction, RefundStore};
use cinebook_entity::booking::{Booking, BookingFilter, BookingStats};
use cinebook_entity::hall::{Hall, SeatConfig, SeatType};
use cinebook_entity::refund::{CreateQueuedRefund, QueuedRefund};
use cinebook_entity::show::Show;
use cinebook_entity::user::{HistoryEntry, UserRole};
use cinebook_payment::{MockPaymentGateway, PaymentClient};

use crate::booking::{BookingQueryService, BookingService};
use crate::context::RequestContext;
use crate::refund::RefundCompensator;
use crate::seat::SeatLockManager;

/// Flat show price in minor units.
pub const SHOW_PRICE: i64 = 1000;
/// Seat-map price of `V1`.
pub const VIP_PRICE: i64 = 2500;

pub fn seats(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Hall with `A1`..`A10` at the show price and a priced VIP seat `V1`.
pub fn sample_hall() -> Hall {
    let mut seat_map: Vec<SeatConfig> = (1..=10)
        .map(|number| SeatConfig {
            row: "A".into(),
            number,
            seat_type: SeatType::Regular,
            price: None,
        })
        .collect();
    seat_map.push(SeatConfig {
        row: "V".into(),
        number: 1,
        seat_type: SeatType::Vip,
        price: Some(VIP_PRICE),
    });

    Hall {
        id: HallId::new(),
        name: "Hall 1".into(),
        seat_map: Json(seat_map),
        created_at: Utc::now(),
    }
}

/// Show starting `starts_in` from now with `booked` already sold.
pub fn sample_show(starts_in: chrono::Duration, booked: &[&str]) -> Show {
    let now = Utc::now();
    let start = now + starts_in;
    Show {
        id: ShowId::new(),
        event_id: EventId::new(),
        hall_id: HallId::new(),
        start_time: start,
        end_time: start + chrono::Duration::hours(2),
        total_seats: 100,
        price: SHOW_PRICE,
        booked_seats: seats(booked),
        created_at: now,
        updated_at: now,
    }
}

pub struct FixtureOptions {
    pub starts_in: chrono::Duration,
    pub booked: Vec<String>,
    pub failing_commit: bool,
    pub refund_queue_down: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            starts_in: chrono::Duration::hours(48),
            booked: Vec::new(),
            failing_commit: false,
            refund_queue_down: false,
        }
    }
}

/// Fully wired services around one show.
pub struct Fixture {
    pub show_id: ShowId,
    pub lock_store: Arc<MemoryLockStore>,
    pub store: Arc<dyn BookingStore>,
    pub refund_store: Arc<MemoryRefundStore>,
    pub gateway: Arc<MockPaymentGateway>,
    pub payments: PaymentClient,
    pub seats: SeatLockManager,
    pub compensator: RefundCompensator,
    pub bookings: BookingService,
    pub queries: BookingQueryService,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(FixtureOptions::default()).await
    }

    pub async fn with_booked(booked: &[&str]) -> Self {
        Self::build(FixtureOptions {
            booked: seats(booked),
            ..FixtureOptions::default()
        })
        .await
    }

    pub async fn build(options: FixtureOptions) -> Self {
        let memory = MemoryBookingStore::new();
        let hall = sample_hall();
        let mut show = sample_show(options.starts_in, &[]);
        show.hall_id = hall.id;
        show.booked_seats = options.booked;
        let show_id = show.id;
        memory.insert_hall(hall).await;
        memory.insert_show(show).await;

        let store: Arc<dyn BookingStore> = if options.failing_commit {
            Arc::new(FailingCommitStore { inner: memory })
        } else {
            Arc::new(memory)
        };

        let lock_store = Arc::new(MemoryLockStore::new());
        let refund_store = Arc::new(MemoryRefundStore::new());
        let gateway = Arc::new(MockPaymentGateway::reliable());
        let payments = PaymentClient::new(gateway.clone(), &PaymentConfig::default());
        let booking_config = BookingConfig::default();

        let seats = SeatLockManager::new(lock_store.clone(), store.clone(), &booking_config);
        let refund_queue: Arc<dyn RefundStore> = if options.refund_queue_down {
            Arc::new(UnavailableRefundQueue)
        } else {
            refund_store.clone()
        };
        let compensator = RefundCompensator::new(
            refund_queue,
            store.clone(),
            payments.clone(),
            RefundConfig::default(),
        );
        let bookings = BookingService::new(
            store.clone(),
            seats.clone(),
            payments.clone(),
            compensator.clone(),
            &booking_config,
        );
        let queries = BookingQueryService::new(store.clone());

        Self {
            show_id,
            lock_store,
            store,
            refund_store,
            gateway,
            payments,
            seats,
            compensator,
            bookings,
            queries,
        }
    }

    /// A fresh customer.
    pub fn user(&self) -> RequestContext {
        RequestContext::new(UserId::new(), UserRole::User)
    }

    /// A fresh administrator.
    pub fn admin(&self) -> RequestContext {
        RequestContext::new(UserId::new(), UserRole::Admin)
    }

    /// Current state of the fixture show.
    pub async fn show(&self) -> Show {
        self.store
            .find_show(self.show_id)
            .await
            .expect("find show")
            .expect("show exists")
    }
}

/// Memory store whose transactions roll back instead of committing.
#[derive(Debug)]
pub struct FailingCommitStore {
    inner: MemoryBookingStore,
}

#[async_trait]
impl BookingStore for FailingCommitStore {
    async fn begin(&self) -> AppResult<Box<dyn BookingTransaction>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FailingCommitTransaction { inner }))
    }

    async fn find_show(&self, id: ShowId) -> AppResult<Option<Show>> {
        self.inner.find_show(id).await
    }

    async fn find_hall(&self, id: HallId) -> AppResult<Option<Hall>> {
        self.inner.find_hall(id).await
    }

    async fn find_booking(&self, id: BookingId) -> AppResult<Option<Booking>> {
        self.inner.find_booking(id).await
    }

    async fn find_bookings_by_user(&self, user_id: UserId) -> AppResult<Vec<Booking>> {
        self.inner.find_bookings_by_user(user_id).await
    }

    async fn find_active_bookings_by_show(&self, show_id: ShowId) -> AppResult<Vec<Booking>> {
        self.inner.find_active_bookings_by_show(show_id).await
    }

    async fn count_active_bookings(&self, show_id: ShowId) -> AppResult<i64> {
        self.inner.count_active_bookings(show_id).await
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Booking>> {
        self.inner.list_bookings(filter, page).await
    }

    async fn booking_stats(&self, today_since: DateTime<Utc>) -> AppResult<BookingStats> {
        self.inner.booking_stats(today_since).await
    }

    async fn find_history(&self, user_id: UserId) -> AppResult<Vec<HistoryEntry>> {
        self.inner.find_history(user_id).await
    }

    async fn record_refund(&self, booking_id: BookingId, refund_id: &str) -> AppResult<bool> {
        self.inner.record_refund(booking_id, refund_id).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

struct FailingCommitTransaction {
    inner: Box<dyn BookingTransaction>,
}

#[async_trait]
impl BookingTransaction for FailingCommitTransaction {
    async fn show_for_update(&mut self, id: ShowId) -> AppResult<Option<Show>> {
        self.inner.show_for_update(id).await
    }

    async fn booking_for_update(
        &mut self,
        id: BookingId,
        user_id: UserId,
    ) -> AppResult<Option<Booking>> {
        self.inner.booking_for_update(id, user_id).await
    }

    async fn insert_booking(&mut self, booking: &Booking) -> AppResult<()> {
        self.inner.insert_booking(booking).await
    }

    async fn update_cancellation(&mut self, booking: &Booking) -> AppResult<()> {
        self.inner.update_cancellation(booking).await
    }

    async fn add_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()> {
        self.inner.add_booked_seats(show_id, seats).await
    }

    async fn remove_booked_seats(&mut self, show_id: ShowId, seats: &[String]) -> AppResult<()> {
        self.inner.remove_booked_seats(show_id, seats).await
    }

    async fn push_history(&mut self, entry: &HistoryEntry) -> AppResult<()> {
        self.inner.push_history(entry).await
    }

    async fn pull_history(&mut self, user_id: UserId, booking_id: BookingId) -> AppResult<()> {
        self.inner.pull_history(user_id, booking_id).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.inner.rollback().await?;
        Err(AppError::database("simulated commit failure"))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.inner.rollback().await
    }
}

/// Refund queue whose every call fails.
#[derive(Debug)]
pub struct UnavailableRefundQueue;

fn queue_down() -> AppError {
    AppError::database("refund queue unavailable")
}

#[async_trait]
impl RefundStore for UnavailableRefundQueue {
    async fn enqueue(&self, _data: CreateQueuedRefund) -> AppResult<QueuedRefund> {
        Err(queue_down())
    }

    async fn claim_due(
        &self,
        _max_attempts: i32,
        _lease_seconds: i64,
        _limit: i64,
    ) -> AppResult<Vec<QueuedRefund>> {
        Err(queue_down())
    }

    async fn remove(&self, _id: RefundEntryId) -> AppResult<()> {
        Err(queue_down())
    }

    async fn record_failure(&self, _id: RefundEntryId, _error: &str) -> AppResult<()> {
        Err(queue_down())
    }

    async fn release(&self, _id: RefundEntryId) -> AppResult<()> {
        Err(queue_down())
    }

    async fn find_pending(&self, _max_attempts: i32) -> AppResult<Vec<QueuedRefund>> {
        Err(queue_down())
    }

    async fn find_exhausted(&self, _max_attempts: i32) -> AppResult<Vec<QueuedRefund>> {
        Err(queue_down())
    }

    async fn find_by_booking(&self, _booking_id: BookingId) -> AppResult<Vec<QueuedRefund>> {
        Err(queue_down())
    }
}

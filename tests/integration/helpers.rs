//! Shared test helpers for integration tests.
//!
//! Every `TestApp` runs the full router against in-memory stores and a
//! scripted payment gateway, with one show 48 hours out.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::types::Json;
use tower::ServiceExt;

use cinebook_api::{AppState, build_router};
use cinebook_auth::JwtEncoder;
use cinebook_cache::memory::MemoryLockStore;
use cinebook_core::config::{AppConfig, PaymentConfig};
use cinebook_core::types::id::{EventId, HallId, ShowId, UserId};
use cinebook_database::memory::{MemoryBookingStore, MemoryRefundStore};
use cinebook_entity::hall::{Hall, SeatConfig, SeatType};
use cinebook_entity::show::Show;
use cinebook_entity::user::UserRole;
use cinebook_payment::{MockPaymentGateway, PaymentClient};

/// Flat price of every show created here.
pub const SHOW_PRICE: i64 = 1000;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Show 48 hours out
    pub show_id: ShowId,
    /// Booking store, for seeding shows
    pub store: Arc<MemoryBookingStore>,
    /// Refund queue
    pub refund_store: Arc<MemoryRefundStore>,
    /// Scriptable gateway
    pub gateway: Arc<MockPaymentGateway>,
    hall_id: HallId,
    encoder: JwtEncoder,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when empty
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// A response header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a test application with a customized configuration
    pub async fn with_config(mut config: AppConfig) -> Self {
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.worker.enabled = false;

        let store = Arc::new(MemoryBookingStore::new());
        let refund_store = Arc::new(MemoryRefundStore::new());
        let gateway = Arc::new(MockPaymentGateway::reliable());
        let payments = PaymentClient::new(gateway.clone(), &PaymentConfig::default());

        let hall = sample_hall();
        let hall_id = hall.id;
        store.insert_hall(hall).await;

        let encoder = JwtEncoder::new(&config.auth);
        let state = AppState::new(
            config,
            Arc::new(MemoryLockStore::new()),
            store.clone(),
            refund_store.clone(),
            payments,
        );

        let mut app = Self {
            router: build_router(state),
            show_id: ShowId::new(),
            store,
            refund_store,
            gateway,
            hall_id,
            encoder,
        };
        app.show_id = app.add_show(Duration::hours(48)).await;
        app
    }

    /// Add a show in the test hall starting `starts_in` from now
    pub async fn add_show(&self, starts_in: Duration) -> ShowId {
        let now = Utc::now();
        let start = now + starts_in;
        let show = Show {
            id: ShowId::new(),
            event_id: EventId::new(),
            hall_id: self.hall_id,
            start_time: start,
            end_time: start + Duration::hours(2),
            total_seats: 11,
            price: SHOW_PRICE,
            booked_seats: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let id = show.id;
        self.store.insert_show(show).await;
        id
    }

    /// Token for a fresh customer
    pub fn user(&self) -> (UserId, String) {
        self.token(UserRole::User)
    }

    /// Token for a fresh administrator
    pub fn admin(&self) -> (UserId, String) {
        self.token(UserRole::Admin)
    }

    fn token(&self, role: UserRole) -> (UserId, String) {
        let user_id = UserId::new();
        let token = self
            .encoder
            .encode(user_id, role)
            .expect("Failed to encode token");
        (user_id, token)
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_with_headers(method, path, body, token, &[])
            .await
    }

    /// Make an HTTP request with extra headers
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("Failed to serialize body"))
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Confirm a booking for `seats` on the main show
    pub async fn confirm(&self, token: &str, seats: &[&str]) -> TestResponse {
        self.confirm_on(self.show_id, token, seats).await
    }

    /// Confirm a booking for `seats` on `show_id`
    pub async fn confirm_on(&self, show_id: ShowId, token: &str, seats: &[&str]) -> TestResponse {
        self.request(
            "POST",
            "/api/bookings/confirm",
            Some(serde_json::json!({
                "show_id": show_id,
                "seat_ids": seats,
                "payment_token": "tok_visa",
            })),
            Some(token),
        )
        .await
    }
}

/// Hall with `A1`..`A10` at the show price and a VIP seat `V1` at 2500.
fn sample_hall() -> Hall {
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
        price: Some(2500),
    });

    Hall {
        id: HallId::new(),
        name: "Hall 1".into(),
        seat_map: Json(seat_map),
        created_at: Utc::now(),
    }
}

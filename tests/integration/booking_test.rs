//! Integration tests for booking confirmation and cancellation.

mod helpers;

use axum::http::StatusCode;
use chrono::Duration;
use cinebook_payment::MockOutcome;
use serde_json::json;

use helpers::{SHOW_PRICE, TestApp};

#[tokio::test]
async fn test_confirm_creates_booking_and_releases_locks() {
    let app = TestApp::new().await;
    let (user_id, token) = app.user();

    let locked = app
        .request(
            "POST",
            "/api/bookings/lock-multiple",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["A1", "A2"] })),
            Some(&token),
        )
        .await;
    assert_eq!(locked.status, StatusCode::OK);

    let response = app.confirm(&token, &["A1", "A2"]).await;

    assert_eq!(response.status, StatusCode::CREATED);
    let booking = response.data();
    assert_eq!(booking["status"], "CONFIRMED");
    assert_eq!(booking["user_id"], user_id.to_string());
    assert_eq!(booking["total_amount"], 2 * SHOW_PRICE);
    assert_eq!(booking["seats"], json!(["A1", "A2"]));
    assert!(booking["payment_id"].as_str().is_some());

    let status = app
        .request(
            "GET",
            &format!("/api/bookings/lock/{}/A1", app.show_id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status.data()["locked"], false);
}

#[tokio::test]
async fn test_vip_seat_uses_seat_map_price() {
    let app = TestApp::new().await;
    let (_, token) = app.user();

    let response = app.confirm(&token, &["A1", "V1"]).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["total_amount"], SHOW_PRICE + 2500);
}

#[tokio::test]
async fn test_confirm_rejects_sold_seat() {
    let app = TestApp::new().await;
    let (_, first) = app.user();
    let (_, second) = app.user();

    assert_eq!(app.confirm(&first, &["A3"]).await.status, StatusCode::CREATED);
    let response = app.confirm(&second, &["A3", "A4"]).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["success"], false);
    assert_eq!(app.gateway.charges().await.len(), 1);
}

#[tokio::test]
async fn test_declined_payment_releases_locks() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    app.gateway.script_charges([MockOutcome::Decline]).await;

    app.request(
        "POST",
        "/api/bookings/lock",
        Some(json!({ "show_id": app.show_id, "seat_id": "A5" })),
        Some(&token),
    )
    .await;

    let response = app.confirm(&token, &["A5"]).await;
    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.body["error"], "PAYMENT");

    let status = app
        .request(
            "GET",
            &format!("/api/bookings/lock/{}/A5", app.show_id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(status.data()["locked"], false);
}

#[tokio::test]
async fn test_confirm_validates_body() {
    let app = TestApp::new().await;
    let (_, token) = app.user();

    let response = app
        .request(
            "POST",
            "/api/bookings/confirm",
            Some(json!({ "show_id": app.show_id, "seat_ids": [], "payment_token": "tok" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");

    let response = app.confirm(&token, &["Z"]).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_confirm_requires_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/bookings/confirm",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["A1"], "payment_token": "tok" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_idempotent_confirm_replays_stored_response() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    let body = json!({
        "show_id": app.show_id,
        "seat_ids": ["A6"],
        "payment_token": "tok_visa",
    });
    let headers = [("Idempotency-Key", "order-42")];

    let first = app
        .request_with_headers("POST", "/api/bookings/confirm", Some(body.clone()), Some(&token), &headers)
        .await;
    let second = app
        .request_with_headers("POST", "/api/bookings/confirm", Some(body), Some(&token), &headers)
        .await;

    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(first.data()["id"], second.data()["id"]);
    assert!(first.header("idempotent-replayed").is_none());
    assert_eq!(second.header("idempotent-replayed"), Some("true"));
    assert_eq!(app.gateway.charges().await.len(), 1);
}

#[tokio::test]
async fn test_idempotency_key_is_scoped_per_user() {
    let app = TestApp::new().await;
    let (_, alice) = app.user();
    let (_, bob) = app.user();
    let headers = [("Idempotency-Key", "shared-key")];

    let first = app
        .request_with_headers(
            "POST",
            "/api/bookings/confirm",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["A7"], "payment_token": "tok" })),
            Some(&alice),
            &headers,
        )
        .await;
    let second = app
        .request_with_headers(
            "POST",
            "/api/bookings/confirm",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["A8"], "payment_token": "tok" })),
            Some(&bob),
            &headers,
        )
        .await;

    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(second.status, StatusCode::CREATED);
    assert_ne!(first.data()["id"], second.data()["id"]);
    assert!(second.header("idempotent-replayed").is_none());
}

#[tokio::test]
async fn test_failed_confirm_is_replayed_not_recharged() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    app.gateway.script_charges([MockOutcome::Decline]).await;
    let body = json!({ "show_id": app.show_id, "seat_ids": ["A9"], "payment_token": "tok" });
    let headers = [("Idempotency-Key", "declined-once")];

    let first = app
        .request_with_headers("POST", "/api/bookings/confirm", Some(body.clone()), Some(&token), &headers)
        .await;
    let second = app
        .request_with_headers("POST", "/api/bookings/confirm", Some(body), Some(&token), &headers)
        .await;

    assert_eq!(first.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(second.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(second.header("idempotent-replayed"), Some("true"));
    assert_eq!(app.gateway.charge_attempts().await, 1);
}

#[tokio::test]
async fn test_confirm_rate_limit() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    let invalid = json!({ "show_id": app.show_id, "seat_ids": [], "payment_token": "tok" });

    for _ in 0..5 {
        let response = app
            .request("POST", "/api/bookings/confirm", Some(invalid.clone()), Some(&token))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.header("x-ratelimit-remaining").is_some());
    }

    let response = app
        .request("POST", "/api/bookings/confirm", Some(invalid), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("x-ratelimit-remaining"), Some("0"));
    assert!(response.header("retry-after").is_some());

    // Limits are per caller.
    let (_, other) = app.user();
    assert_eq!(app.confirm(&other, &["A10"]).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancel_refunds_in_full_well_ahead() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    let booking = app.confirm(&token, &["A1", "A2"]).await;
    let id = booking.data()["id"].as_str().expect("id").to_string();

    let response = app
        .request(
            "POST",
            &format!("/api/bookings/{}/cancel", id),
            Some(json!({ "reason": "Plans changed" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let cancelled = response.data();
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["refund_amount"], 2 * SHOW_PRICE);
    assert_eq!(cancelled["cancellation_reason"], "Plans changed");
    assert!(cancelled["refund_id"].as_str().is_some());
    assert_eq!(app.gateway.refunds().await[0].amount, 2 * SHOW_PRICE);

    // Seats go back on sale.
    let (_, other) = app.user();
    assert_eq!(app.confirm(&other, &["A1"]).await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancel_without_body_gives_partial_refund_inside_a_day() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    let show_id = app.add_show(Duration::hours(10)).await;
    let booking = app.confirm_on(show_id, &token, &["A1", "A2"]).await;
    let id = booking.data()["id"].as_str().expect("id").to_string();

    let response = app
        .request("POST", &format!("/api/bookings/{}/cancel", id), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["refund_amount"], SHOW_PRICE);
}

#[tokio::test]
async fn test_cancel_too_close_to_start_is_refused() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    let show_id = app.add_show(Duration::hours(1)).await;
    let booking = app.confirm_on(show_id, &token, &["A1"]).await;
    let id = booking.data()["id"].as_str().expect("id").to_string();

    let response = app
        .request("POST", &format!("/api/bookings/{}/cancel", id), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "POLICY");
    assert!(app.gateway.refunds().await.is_empty());
}

#[tokio::test]
async fn test_cancel_queues_refund_when_gateway_declines() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    let booking = app.confirm(&token, &["A3"]).await;
    let id = booking.data()["id"].as_str().expect("id").to_string();
    app.gateway.script_refunds([MockOutcome::Decline]).await;

    let response = app
        .request("POST", &format!("/api/bookings/{}/cancel", id), None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "CANCELLED");
    assert!(response.data()["refund_id"].is_null());

    let queued = app.refund_store.all().await;
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].amount, SHOW_PRICE);
    assert_eq!(queued[0].booking_id.to_string(), id);
}

#[tokio::test]
async fn test_cannot_cancel_someone_elses_booking() {
    let app = TestApp::new().await;
    let (_, owner) = app.user();
    let (_, stranger) = app.user();
    let booking = app.confirm(&owner, &["A4"]).await;
    let id = booking.data()["id"].as_str().expect("id").to_string();

    let response = app
        .request("POST", &format!("/api/bookings/{}/cancel", id), None, Some(&stranger))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let again = app
        .request("POST", &format!("/api/bookings/{}/cancel", id), None, Some(&owner))
        .await;
    assert_eq!(again.status, StatusCode::OK);
}

#[tokio::test]
async fn test_booking_visibility() {
    let app = TestApp::new().await;
    let (_, owner) = app.user();
    let (_, stranger) = app.user();
    let (_, admin) = app.admin();
    let booking = app.confirm(&owner, &["A5"]).await;
    let path = format!("/api/bookings/{}", booking.data()["id"].as_str().expect("id"));

    assert_eq!(app.request("GET", &path, None, Some(&owner)).await.status, StatusCode::OK);
    assert_eq!(
        app.request("GET", &path, None, Some(&stranger)).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.request("GET", &path, None, Some(&admin)).await.status, StatusCode::OK);
    assert_eq!(
        app.request("GET", "/api/bookings/not-a-uuid", None, Some(&owner))
            .await
            .status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_my_bookings_and_history() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    app.confirm(&token, &["A1"]).await;
    let second = app.confirm(&token, &["A2"]).await;
    let id = second.data()["id"].as_str().expect("id").to_string();

    let mine = app.request("GET", "/api/bookings/me", None, Some(&token)).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.data().as_array().expect("list").len(), 2);

    app.request("POST", &format!("/api/bookings/{}/cancel", id), None, Some(&token))
        .await;

    let history = app
        .request("GET", "/api/bookings/me/history", None, Some(&token))
        .await;
    let entries = history.data().as_array().expect("list");
    assert_eq!(entries.len(), 1);
    assert_ne!(entries[0]["booking_id"], id.as_str());
}

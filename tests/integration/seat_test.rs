//! Integration tests for seat locking.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::TestApp;

async fn lock(app: &TestApp, token: &str, seat: &str) -> helpers::TestResponse {
    app.request(
        "POST",
        "/api/bookings/lock",
        Some(json!({ "show_id": app.show_id, "seat_id": seat })),
        Some(token),
    )
    .await
}

#[tokio::test]
async fn test_lock_is_exclusive() {
    let app = TestApp::new().await;
    let (_, alice) = app.user();
    let (_, bob) = app.user();

    let first = lock(&app, &alice, "B3").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["locked"], true);
    assert_eq!(first.data()["ttl_seconds"], 300);

    let second = lock(&app, &bob, "B3").await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["details"]["seat_id"], "B3");
}

#[tokio::test]
async fn test_lock_status_reports_remaining_ttl() {
    let app = TestApp::new().await;
    let (_, token) = app.user();
    let path = format!("/api/bookings/lock/{}/C7", app.show_id);

    let before = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(before.status, StatusCode::OK);
    assert_eq!(before.data()["locked"], false);
    assert_eq!(before.data()["ttl_seconds"], 0);

    lock(&app, &token, "C7").await;
    let after = app.request("GET", &path, None, Some(&token)).await;
    assert_eq!(after.data()["locked"], true);
    let ttl = after.data()["ttl_seconds"].as_i64().expect("ttl");
    assert!(ttl > 0 && ttl <= 300);
}

#[tokio::test]
async fn test_lock_multiple_is_all_or_nothing() {
    let app = TestApp::new().await;
    let (_, alice) = app.user();
    let (_, bob) = app.user();
    lock(&app, &alice, "D2").await;

    let response = app
        .request(
            "POST",
            "/api/bookings/lock-multiple",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["D1", "D2", "D3"] })),
            Some(&bob),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["details"]["failed"], json!(["D1", "D2", "D3"]));

    // D1 and D3 were released again.
    assert_eq!(lock(&app, &alice, "D1").await.status, StatusCode::OK);
    assert_eq!(lock(&app, &alice, "D3").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_lock_multiple_refuses_sold_seats() {
    let app = TestApp::new().await;
    let (_, buyer) = app.user();
    let (_, other) = app.user();
    assert_eq!(app.confirm(&buyer, &["A1"]).await.status, StatusCode::CREATED);

    let response = app
        .request(
            "POST",
            "/api/bookings/lock-multiple",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["A1", "A2"] })),
            Some(&other),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unlock_frees_seats() {
    let app = TestApp::new().await;
    let (_, alice) = app.user();
    let (_, bob) = app.user();

    let locked = app
        .request(
            "POST",
            "/api/bookings/lock-multiple",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["E1", "E2"] })),
            Some(&alice),
        )
        .await;
    assert_eq!(locked.status, StatusCode::OK);
    assert_eq!(locked.data()["locked"], json!(["E1", "E2"]));

    let unlocked = app
        .request(
            "POST",
            "/api/bookings/unlock",
            Some(json!({ "show_id": app.show_id, "seat_ids": ["E1", "E2"] })),
            Some(&alice),
        )
        .await;
    assert_eq!(unlocked.status, StatusCode::OK);

    assert_eq!(lock(&app, &bob, "E2").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_extend_lock() {
    let app = TestApp::new().await;
    let (_, token) = app.user();

    let missing = app
        .request(
            "POST",
            "/api/bookings/lock/extend",
            Some(json!({ "show_id": app.show_id, "seat_id": "F1" })),
            Some(&token),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    lock(&app, &token, "F1").await;
    let extended = app
        .request(
            "POST",
            "/api/bookings/lock/extend",
            Some(json!({ "show_id": app.show_id, "seat_id": "F1", "ttl_seconds": 900 })),
            Some(&token),
        )
        .await;
    assert_eq!(extended.status, StatusCode::OK);
    let ttl = extended.data()["ttl_seconds"].as_i64().expect("ttl");
    assert!(ttl > 300 && ttl <= 900);
}

#[tokio::test]
async fn test_lock_rejects_malformed_input() {
    let app = TestApp::new().await;
    let (_, token) = app.user();

    assert_eq!(lock(&app, &token, "a1").await.status, StatusCode::BAD_REQUEST);

    let too_many: Vec<String> = (1..=11).map(|n| format!("G{n}")).collect();
    let response = app
        .request(
            "POST",
            "/api/bookings/lock-multiple",
            Some(json!({ "show_id": app.show_id, "seat_ids": too_many })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["details"]["seat_ids"].is_array());

    let bad_show = app
        .request("GET", "/api/bookings/lock/nope/A1", None, Some(&token))
        .await;
    assert_eq!(bad_show.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lock_requires_authentication() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/bookings/lock",
            Some(json!({ "show_id": app.show_id, "seat_id": "A1" })),
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_seat_lock_rate_limit() {
    let app = TestApp::new().await;
    let (_, token) = app.user();

    for n in 1..=20 {
        let response = lock(&app, &token, &format!("H{n}")).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let response = lock(&app, &token, "H21").await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("x-ratelimit-limit"), Some("20"));
}

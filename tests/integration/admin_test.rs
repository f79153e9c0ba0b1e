//! Integration tests for admin views and health.

mod helpers;

use axum::http::StatusCode;
use cinebook_payment::MockOutcome;

use helpers::{SHOW_PRICE, TestApp};

async fn cancel(app: &TestApp, token: &str, booking: &helpers::TestResponse) {
    let id = booking.data()["id"].as_str().expect("id");
    let response = app
        .request("POST", &format!("/api/bookings/{}/cancel", id), None, Some(token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new().await;
    let (_, token) = app.user();

    for path in [
        "/api/admin/bookings".to_string(),
        "/api/admin/bookings/stats".to_string(),
        format!("/api/admin/shows/{}/bookings", app.show_id),
        "/api/admin/refunds".to_string(),
    ] {
        let response = app.request("GET", &path, None, Some(&token)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(response.body["error"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn test_list_bookings_filters_and_paginates() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin();
    let (alice_id, alice) = app.user();
    let (_, bob) = app.user();

    app.confirm(&alice, &["A1"]).await;
    app.confirm(&alice, &["A2"]).await;
    let bobs = app.confirm(&bob, &["A3"]).await;
    cancel(&app, &bob, &bobs).await;

    let all = app
        .request("GET", "/api/admin/bookings?per_page=2", None, Some(&admin))
        .await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.data()["total_items"], 3);
    assert_eq!(all.data()["items"].as_array().expect("items").len(), 2);
    assert_eq!(all.data()["has_next"], true);

    let cancelled = app
        .request("GET", "/api/admin/bookings?status=CANCELLED", None, Some(&admin))
        .await;
    assert_eq!(cancelled.data()["total_items"], 1);

    let by_user = app
        .request(
            "GET",
            &format!("/api/admin/bookings?user_id={}", alice_id),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(by_user.data()["total_items"], 2);

    let bad = app
        .request("GET", "/api/admin/bookings?status=LOST", None, Some(&admin))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_count_revenue_of_confirmed_bookings() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin();
    let (_, token) = app.user();

    app.confirm(&token, &["A1", "A2"]).await;
    let cancelled = app.confirm(&token, &["A3"]).await;
    cancel(&app, &token, &cancelled).await;

    let response = app
        .request("GET", "/api/admin/bookings/stats", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let stats = response.data();
    assert_eq!(stats["total_bookings"], 2);
    assert_eq!(stats["confirmed_bookings"], 1);
    assert_eq!(stats["cancelled_bookings"], 1);
    assert_eq!(stats["total_revenue"], 2 * SHOW_PRICE);
    assert_eq!(stats["today_bookings"], 2);
}

#[tokio::test]
async fn test_show_bookings_excludes_cancelled() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin();
    let (_, token) = app.user();

    app.confirm(&token, &["A1"]).await;
    let cancelled = app.confirm(&token, &["A2"]).await;
    cancel(&app, &token, &cancelled).await;

    let response = app
        .request(
            "GET",
            &format!("/api/admin/shows/{}/bookings", app.show_id),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["active_count"], 1);
    assert_eq!(response.data()["bookings"].as_array().expect("list").len(), 1);
}

#[tokio::test]
async fn test_refund_queue_lists_pending_entries() {
    let app = TestApp::new().await;
    let (_, admin) = app.admin();
    let (_, token) = app.user();
    let booking = app.confirm(&token, &["A4"]).await;
    app.gateway.script_refunds([MockOutcome::Decline]).await;
    cancel(&app, &token, &booking).await;

    let response = app
        .request("GET", "/api/admin/refunds", None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let pending = response.data()["pending"].as_array().expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["amount"], SHOW_PRICE);
    assert_eq!(pending[0]["attempts"], 0);
    assert!(response.data()["exhausted"].as_array().expect("exhausted").is_empty());
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["lock_store"], true);
    assert_eq!(response.data()["database"], true);
    assert_eq!(
        response.data()["payment_breakers"]
            .as_array()
            .expect("breakers")
            .len(),
        2
    );
}

//! End-to-end tests for warranty registration, serial resolution, and
//! the repair prefill workflow.

mod common;

use axum::{body, http::Method, response::Response};
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::{json, Value};

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

fn registration_payload(serial: &str, purchase_days_ago: i64, months: i32) -> Value {
    let purchase_date = (Utc::now().date_naive() - Duration::days(purchase_days_ago)).to_string();
    json!({
        "serial_number": serial,
        "product_name": "ProBook 450 G10",
        "category": "Laptop",
        "customer_name": "Kamal Silva",
        "customer_phone": "0712345678",
        "customer_email": "kamal@example.com",
        "purchase_date": purchase_date,
        "warranty_months": months
    })
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn resolving_a_registered_serial_derives_warranty_state() {
    let app = TestApp::new().await;

    // 80 days into a 3-month (90-day) warranty.
    let register = app
        .request_authenticated(
            Method::POST,
            "/api/v1/warranties",
            Some(registration_payload("SN-RESOLVE-1", 80, 3)),
        )
        .await;
    assert_eq!(register.status(), 200);

    let resolve = app
        .request_authenticated(Method::GET, "/api/v1/warranties/serial/SN-RESOLVE-1", None)
        .await;
    assert_eq!(resolve.status(), 200);

    let data = response_json(resolve).await["data"].clone();
    assert_eq!(data["is_under_warranty"], true);
    assert_eq!(data["warranty_remaining_days"], 10);
    assert_eq!(data["customer_name"], "Kamal Silva");
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn lapsed_warranties_resolve_as_not_covered() {
    let app = TestApp::new().await;

    // 100 days into a 3-month (90-day) warranty: lapsed.
    app.request_authenticated(
        Method::POST,
        "/api/v1/warranties",
        Some(registration_payload("SN-LAPSED-1", 100, 3)),
    )
    .await;

    let resolve = app
        .request_authenticated(Method::GET, "/api/v1/warranties/serial/SN-LAPSED-1", None)
        .await;
    let data = response_json(resolve).await["data"].clone();
    assert_eq!(data["is_under_warranty"], false);
    assert_eq!(data["warranty_remaining_days"], -10);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn unknown_serials_are_a_not_found_branch() {
    let app = TestApp::new().await;

    let resolve = app
        .request_authenticated(Method::GET, "/api/v1/warranties/serial/SN-MISSING", None)
        .await;
    assert_eq!(resolve.status(), 404);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn serial_fragment_search_respects_the_length_guard() {
    let app = TestApp::new().await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/warranties",
        Some(registration_payload("SN-GUARD-1", 10, 12)),
    )
    .await;

    // One character: short-circuits to empty without searching.
    let short = app
        .request_authenticated(Method::GET, "/api/v1/warranties/search?serial=S", None)
        .await;
    assert_eq!(response_json(short).await["data"], json!([]));

    // Two characters: hits the index.
    let hits = app
        .request_authenticated(Method::GET, "/api/v1/warranties/search?serial=SN", None)
        .await;
    let data = response_json(hits).await["data"].clone();
    assert_eq!(data[0]["serial_number"], "SN-GUARD-1");
    assert_eq!(data[0]["is_under_warranty"], true);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn duplicate_serial_registration_conflicts() {
    let app = TestApp::new().await;

    let first = app
        .request_authenticated(
            Method::POST,
            "/api/v1/warranties",
            Some(registration_payload("SN-DUP-1", 5, 12)),
        )
        .await;
    assert_eq!(first.status(), 200);

    let second = app
        .request_authenticated(
            Method::POST,
            "/api/v1/warranties",
            Some(registration_payload("SN-DUP-1", 5, 12)),
        )
        .await;
    assert_eq!(second.status(), 409);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn prefill_fills_customer_and_device_fields_and_locks_them() {
    let app = TestApp::new().await;

    app.request_authenticated(
        Method::POST,
        "/api/v1/warranties",
        Some(registration_payload("SN-PREFILL-1", 30, 12)),
    )
    .await;

    let prefill = app
        .request_authenticated(
            Method::GET,
            "/api/v1/repairs/prefill?serial=SN-PREFILL-1",
            None,
        )
        .await;
    assert_eq!(prefill.status(), 200);

    let draft = response_json(prefill).await["data"].clone();
    assert_eq!(draft["customer_name"], "Kamal Silva");
    assert_eq!(draft["customer_phone"], "0712345678");
    assert_eq!(draft["device_type"], "Laptop");
    assert_eq!(draft["device_model"], "ProBook 450 G10");
    assert_eq!(draft["warranty_flag"], true);
    assert_eq!(draft["customer_locked"], true);
    assert_eq!(draft["device_locked"], true);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn prefill_for_unknown_serial_is_not_found() {
    let app = TestApp::new().await;

    let prefill = app
        .request_authenticated(
            Method::GET,
            "/api/v1/repairs/prefill?serial=SN-NOWHERE",
            None,
        )
        .await;
    assert_eq!(prefill.status(), 404);
}

#[tokio::test]
#[ignore = "requires SQLite integration environment"]
async fn customer_phone_fragment_search_respects_the_guard() {
    let app = TestApp::new().await;

    app.state
        .services
        .customers
        .create_customer("Nimal Perera", "0712345678", "nimal@example.com")
        .await
        .expect("seed customer");

    let short = app
        .request_authenticated(Method::GET, "/api/v1/customers/search?phone=07", None)
        .await;
    assert_eq!(response_json(short).await["data"], json!([]));

    let hits = app
        .request_authenticated(Method::GET, "/api/v1/customers/search?phone=0712", None)
        .await;
    let data = response_json(hits).await["data"].clone();
    assert_eq!(data[0]["phone"], "0712345678");
}

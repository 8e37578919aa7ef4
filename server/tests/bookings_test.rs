//! Booking REST API tests: creation, defaults, listing, input validation.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use booking_server::http::{create_router, AppState};
use booking_server::i18n::Catalog;
use booking_server::store::MemoryBookingStore;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> axum::Router {
    create_router(AppState {
        webhook_secret: None,
        store: Arc::new(MemoryBookingStore::new()),
        catalog: Arc::new(Catalog::load_embedded().expect("embedded locales parse")),
    })
}

fn post_booking(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response is JSON")
}

#[tokio::test]
async fn creation_assigns_id_and_defaults_message() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_booking(
            json!({ "name": "A", "email": "a@b.com", "service": "X", "date": "2024-01-01" })
                .to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok(), "id should be a UUID, got {id}");
    assert_eq!(created["message"], "");

    // A subsequent GET includes the record.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/bookings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed = body_json(response).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id);
    assert_eq!(listed[0]["name"], "A");
}

#[tokio::test]
async fn optional_message_is_stored() {
    let response = app()
        .oneshot(post_booking(
            json!({
                "name": "B",
                "email": "b@c.com",
                "service": "Automation",
                "date": "2024-02-01",
                "message": "Asking about automation services"
            })
            .to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["message"], "Asking about automation services");
}

#[tokio::test]
async fn missing_required_field_is_bad_request() {
    let response = app()
        .oneshot(post_booking(
            json!({ "name": "A", "email": "a@b.com", "service": "X" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing required field: date");
}

#[tokio::test]
async fn blank_required_field_is_bad_request() {
    let response = app()
        .oneshot(post_booking(
            json!({ "name": "  ", "email": "a@b.com", "service": "X", "date": "2024-01-01" })
                .to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let response = app()
        .oneshot(post_booking("{not valid json".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn locale_endpoint_returns_resolved_tree() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/i18n/ar")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["lang"], "ar");
    assert_eq!(body["direction"], "rtl");
    assert_eq!(body["messages"]["nav"]["home"], "الرئيسية");
}

#[tokio::test]
async fn unknown_locale_falls_back_to_default() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/i18n/de")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["lang"], "en");
    assert_eq!(body["direction"], "ltr");
}

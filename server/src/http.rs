//! HTTP surface: webhook receiver, booking REST API, locale catalog,
//! health probe.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::i18n::{direction, Catalog};
use crate::store::{BookingStore, NewBooking};
use crate::types::Booking;
use crate::verification;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "X-SIGN";

#[derive(Clone)]
pub struct AppState {
    pub webhook_secret: Option<String>,
    pub store: Arc<dyn BookingStore>,
    pub catalog: Arc<Catalog>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/webhook/booking", post(receive_booking_webhook))
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/i18n/{lang}", get(locale_catalog))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Signed webhook receiver for finalized funnel payloads.
///
/// Verification runs over the raw body bytes before any JSON parsing. The
/// 401 responses stay generic so callers cannot tell whether the secret or
/// the body was the problem.
async fn receive_booking_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(secret) = state.webhook_secret.as_deref() else {
        tracing::error!("WEBHOOK_SECRET not configured; refusing webhook request");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Server configuration error" })),
        );
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let Some(signature) = signature else {
        tracing::warn!("missing {SIGNATURE_HEADER} header");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized: Missing signature" })),
        );
    };

    if !verification::verify(&body, signature, secret) {
        tracing::warn!("invalid {SIGNATURE_HEADER} signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized: Invalid signature" })),
        );
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            tracing::info!(%payload, "booking webhook received");
            (StatusCode::OK, Json(json!({ "success": true })))
        }
        Err(e) => {
            tracing::error!(error = %e, "invalid JSON payload on verified webhook");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid payload" })),
            )
        }
    }
}

async fn list_bookings(State(state): State<AppState>) -> Json<Vec<Booking>> {
    Json(state.store.list().await)
}

/// Creates a booking record. Required fields must be present and non-empty;
/// no email or date format validation is applied beyond that.
async fn create_booking(State(state): State<AppState>, Json(data): Json<Value>) -> Response {
    let mut fields = [("name", ""), ("email", ""), ("service", ""), ("date", "")];
    for (name, slot) in &mut fields {
        match data.get(*name).and_then(|v| v.as_str()) {
            Some(value) if !value.trim().is_empty() => *slot = value,
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("missing required field: {name}") })),
                )
                    .into_response();
            }
        }
    }
    let [(_, name), (_, email), (_, service), (_, date)] = fields;
    let message = data
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let booking = state
        .store
        .create(NewBooking {
            name: name.to_string(),
            email: email.to_string(),
            service: service.to_string(),
            date: date.to_string(),
            message,
        })
        .await;

    tracing::info!(id = %booking.id, service = %booking.service, "booking created");
    (StatusCode::CREATED, Json(booking)).into_response()
}

/// Resolved locale tree with text direction; unknown tags fall back to the
/// default language.
async fn locale_catalog(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> Json<Value> {
    let resolved = state.catalog.resolve_lang(&lang);
    Json(json!({
        "lang": resolved,
        "direction": direction(resolved),
        "messages": state.catalog.tree(resolved),
    }))
}

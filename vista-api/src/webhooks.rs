use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use vista_booking::PaymentNotification;
use vista_store::paystack::{verify_signature, SIGNATURE_HEADER};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/webhooks/payments", post(handle_payment_webhook))
}

/// POST /api/webhooks/payments
/// The signature covers the raw body, so it is checked before any parsing.
async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".into()))?;

    if !verify_signature(&state.payment_secret, &body, signature) {
        tracing::warn!("payment webhook with invalid signature");
        return Err(AppError::Unauthorized("Invalid webhook signature".into()));
    }

    let notification: PaymentNotification = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Malformed webhook payload: {}", e)))?;
    tracing::info!(event = %notification.event, reference = %notification.data.reference, "payment webhook received");

    state.bookings.handle_notification(notification).await?;
    Ok(Json(json!({ "status": "ok" })))
}

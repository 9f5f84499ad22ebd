//! Domain events for the booking flow.
//!
//! There is no broker behind these: [`publish`] writes each event as one structured
//! log line under the `vista::events` target so downstream log shipping can pick them up.

use serde::Serialize;
use uuid::Uuid;

pub const BOOKING_CREATED: &str = "booking.created";
pub const PAYMENT_INITIALIZED: &str = "payment.initialized";
pub const BOOKING_CONFIRMED: &str = "booking.confirmed";
pub const BOOKING_CANCELLED: &str = "booking.cancelled";

#[derive(Debug, Serialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub reference: String,
    pub explorer_id: Uuid,
    pub listing_type: String,
    pub listing_id: Uuid,
    pub total: i64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct PaymentInitializedEvent {
    pub booking_id: Uuid,
    pub reference: String,
    pub provider: String,
    pub amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct BookingSettledEvent {
    pub booking_id: Uuid,
    pub reference: String,
    pub status: String,
    pub source: String,
    pub timestamp: i64,
}

pub fn publish<E: Serialize>(topic: &str, event: &E) {
    match serde_json::to_string(event) {
        Ok(payload) => tracing::info!(target: "vista::events", topic, %payload, "domain event"),
        Err(e) => tracing::warn!(topic, error = %e, "failed to serialize domain event"),
    }
}

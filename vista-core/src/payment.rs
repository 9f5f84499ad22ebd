use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Abandoned,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Abandoned => "abandoned",
        }
    }

    /// Gateway status strings. Anything the gateway reports as in flight maps to `Pending`.
    pub fn from_gateway(s: &str) -> Self {
        match s {
            "success" => PaymentStatus::Success,
            "failed" | "reversed" => PaymentStatus::Failed,
            "abandoned" => PaymentStatus::Abandoned,
            _ => PaymentStatus::Pending,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            "abandoned" => Some(PaymentStatus::Abandoned),
            _ => None,
        }
    }
}

/// Payment record for a booking. One per booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub provider: String,
    pub status: PaymentStatus,
    pub authorization_url: Option<String>,
    pub access_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn pending(booking: &Booking, provider: &str, session: PaymentSession) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            reference: session.reference,
            amount: booking.total,
            currency: booking.currency.clone(),
            provider: provider.to_string(),
            status: PaymentStatus::Pending,
            authorization_url: Some(session.authorization_url),
            access_code: session.access_code,
            created_at: now,
            updated_at: now,
        }
    }
}

/// What we ask the gateway to collect.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub email: String,
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    pub callback_url: Option<String>,
    pub metadata: serde_json::Value,
}

/// Hosted checkout page handed back by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentSession {
    pub authorization_url: String,
    pub access_code: Option<String>,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPayment {
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment gateway unreachable: {0}")]
    Transport(String),
    #[error("Payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Open a hosted checkout for the request.
    async fn initialize(&self, request: &PaymentRequest) -> Result<PaymentSession, GatewayError>;

    /// Ask the gateway for the current state of a transaction.
    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError>;
}

use serde_json::json;
use std::sync::Arc;
use vista_core::booking::retry_reference;
use vista_core::payment::{PaymentRequest, VerifiedPayment};
use vista_core::{Booking, GatewayError, Payment, PaymentGateway};

pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    callback_url: Option<String>,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, callback_url: Option<String>) -> Self {
        Self { gateway, callback_url }
    }

    pub fn provider(&self) -> &'static str {
        self.gateway.provider()
    }

    /// Opens a hosted checkout for the booking total. The booking reference is the
    /// gateway reference, so notifications can be matched back without a lookup table.
    pub async fn initialize_payment(&self, booking: &Booking) -> Result<Payment, GatewayError> {
        self.open(booking, booking.reference.clone()).await
    }

    /// Opens another checkout under a derived reference. An earlier attempt may
    /// have reached the gateway even though its payment record was never stored.
    pub async fn reinitialize_payment(&self, booking: &Booking) -> Result<Payment, GatewayError> {
        self.open(booking, retry_reference(&booking.reference)).await
    }

    async fn open(&self, booking: &Booking, reference: String) -> Result<Payment, GatewayError> {
        let request = PaymentRequest {
            email: booking.contact.email.expose().clone(),
            amount: booking.total,
            currency: booking.currency.clone(),
            reference: reference.clone(),
            callback_url: self.callback_url.clone(),
            metadata: json!({
                "booking_id": booking.id,
                "listing_type": booking.listing_type,
                "listing_id": booking.listing_id,
            }),
        };

        let session = self.gateway.initialize(&request).await?;
        if session.reference != reference {
            return Err(GatewayError::InvalidResponse(format!(
                "gateway answered with reference {} for {}",
                session.reference, reference
            )));
        }

        Ok(Payment::pending(booking, self.gateway.provider(), session))
    }

    pub async fn verify_payment(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        self.gateway.verify(reference).await
    }
}

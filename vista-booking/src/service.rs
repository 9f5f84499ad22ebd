use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vista_catalog::ListingType;
use vista_core::{
    Booking, BookingRepository, BookingStatus, ListingRepository, Payment, PaymentRepository, PaymentStatus,
    Principal,
};
use vista_shared::models::events::{
    self, BookingCreatedEvent, BookingSettledEvent, PaymentInitializedEvent,
};

use crate::checkout::{CheckoutPlanner, CheckoutRules};
use crate::error::{BookingError, BookingResult};
use crate::lifecycle::{ensure_cancellable, Settlement};
use crate::models::{BookingReceipt, CreateBookingRequest, PaymentNotification};
use crate::orchestrator::PaymentOrchestrator;

/// The booking flow: checkout, the booking transaction, payment initialization and settlement.
pub struct BookingService {
    listings: Arc<dyn ListingRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    planner: CheckoutPlanner,
    orchestrator: PaymentOrchestrator,
}

impl BookingService {
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        orchestrator: PaymentOrchestrator,
        rules: CheckoutRules,
    ) -> Self {
        Self {
            listings,
            bookings,
            payments,
            planner: CheckoutPlanner::new(rules),
            orchestrator,
        }
    }

    pub async fn create_booking(
        &self,
        explorer: &Principal,
        req: CreateBookingRequest,
    ) -> BookingResult<BookingReceipt> {
        let listing_type: ListingType = req.listing_type.parse()?;
        let listing = self
            .listings
            .get_listing(req.listing_id)
            .await?
            .filter(|l| l.is_published && l.listing_type() == listing_type)
            .ok_or_else(|| BookingError::NotFound(format!("{} {} not found", listing_type, req.listing_id)))?;

        let mut booking = self.planner.plan(explorer, &req, &listing, Utc::now())?;
        if booking.total == 0 {
            booking.status = BookingStatus::Confirmed;
        }

        self.bookings.commit_booking(&booking).await?;
        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            listing_type = %booking.listing_type,
            total = booking.total,
            "booking committed"
        );
        events::publish(
            events::BOOKING_CREATED,
            &BookingCreatedEvent {
                booking_id: booking.id,
                reference: booking.reference.clone(),
                explorer_id: booking.explorer_id,
                listing_type: booking.listing_type.to_string(),
                listing_id: booking.listing_id,
                total: booking.total,
                currency: booking.currency.clone(),
                timestamp: Utc::now().timestamp(),
            },
        );

        if booking.total == 0 {
            publish_settled(&booking, BookingStatus::Confirmed, "free");
            return Ok(BookingReceipt { booking, payment: None });
        }

        let payment = self.open_payment(&booking).await;
        Ok(BookingReceipt { booking, payment })
    }

    /// Payment problems never undo the booking: it stays pending without payment data
    /// and the explorer can retry through [`BookingService::resume_payment`].
    async fn open_payment(&self, booking: &Booking) -> Option<Payment> {
        let payment = match self.orchestrator.initialize_payment(booking).await {
            Ok(payment) => payment,
            Err(e) => {
                warn!(booking_id = %booking.id, error = %e, "payment initialization failed, booking kept without payment");
                return None;
            }
        };

        if let Err(e) = self.payments.save_payment(&payment).await {
            warn!(booking_id = %booking.id, error = %e, "failed to store payment record");
            return None;
        }

        events::publish(
            events::PAYMENT_INITIALIZED,
            &PaymentInitializedEvent {
                booking_id: booking.id,
                reference: payment.reference.clone(),
                provider: payment.provider.clone(),
                amount: payment.amount,
                timestamp: Utc::now().timestamp(),
            },
        );
        Some(payment)
    }

    pub async fn get_booking(&self, principal: &Principal, booking_id: Uuid) -> BookingResult<BookingReceipt> {
        let booking = self
            .bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Booking {} not found", booking_id)))?;

        if !principal.can_access(booking.explorer_id) {
            return Err(BookingError::Forbidden("This booking belongs to another explorer".into()));
        }

        let payment = self.payments.get_payment_for_booking(booking.id).await?;
        Ok(BookingReceipt { booking, payment })
    }

    pub async fn list_bookings(&self, principal: &Principal) -> BookingResult<Vec<Booking>> {
        Ok(self.bookings.list_for_explorer(principal.id).await?)
    }

    /// Bookings made against one of the vendor's listings.
    pub async fn listing_bookings(&self, vendor: &Principal, listing_id: Uuid) -> BookingResult<Vec<Booking>> {
        let listing = self
            .listings
            .get_listing(listing_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Listing {} not found", listing_id)))?;

        if !vendor.can_access(listing.vendor_id) {
            return Err(BookingError::Forbidden("This listing belongs to another vendor".into()));
        }

        Ok(self.bookings.list_for_listing(listing_id).await?)
    }

    /// Re-opens a hosted checkout for a pending booking that has no stored payment.
    pub async fn resume_payment(&self, principal: &Principal, booking_id: Uuid) -> BookingResult<BookingReceipt> {
        let receipt = self.get_booking(principal, booking_id).await?;
        if receipt.booking.status != BookingStatus::Pending {
            return Err(BookingError::InvalidInput("Only pending bookings can be paid".into()));
        }
        if receipt.payment.is_some() {
            return Ok(receipt);
        }

        let payment = self.orchestrator.reinitialize_payment(&receipt.booking).await?;
        self.payments.save_payment(&payment).await?;
        info!(booking_id = %booking_id, reference = %payment.reference, "payment re-initialized");

        Ok(BookingReceipt { booking: receipt.booking, payment: Some(payment) })
    }

    /// Client-side "success" callback: asks the gateway and settles the booking accordingly.
    pub async fn verify_payment(&self, principal: &Principal, booking_id: Uuid) -> BookingResult<BookingReceipt> {
        let receipt = self.get_booking(principal, booking_id).await?;
        let payment = receipt
            .payment
            .clone()
            .ok_or_else(|| BookingError::InvalidInput("No payment has been initialized for this booking".into()))?;

        if receipt.booking.status.is_final() {
            return Ok(receipt);
        }

        let verified = self.orchestrator.verify_payment(&payment.reference).await?;
        self.settle(&receipt.booking, &payment, verified.status, verified.amount, "verify")
            .await?;

        self.get_booking(principal, booking_id).await
    }

    /// Client-side "cancel"/"close" callback.
    pub async fn cancel_booking(&self, principal: &Principal, booking_id: Uuid) -> BookingResult<BookingReceipt> {
        let receipt = self.get_booking(principal, booking_id).await?;
        if !ensure_cancellable(receipt.booking.status)? {
            return Ok(receipt);
        }

        if self.bookings.cancel_booking(booking_id).await? {
            if let Some(payment) = receipt.payment.as_ref().filter(|p| p.status == PaymentStatus::Pending) {
                self.payments
                    .update_payment_status(&payment.reference, PaymentStatus::Abandoned)
                    .await?;
            }
            publish_settled(&receipt.booking, BookingStatus::Cancelled, "explorer");
            info!(booking_id = %booking_id, "booking cancelled by explorer");
        }

        self.get_booking(principal, booking_id).await
    }

    /// Gateway webhook. Unknown references and event types are acknowledged and ignored.
    pub async fn handle_notification(&self, notification: PaymentNotification) -> BookingResult<()> {
        let status = match notification.event.as_str() {
            "charge.success" => PaymentStatus::Success,
            "charge.failed" => PaymentStatus::Failed,
            other => {
                debug!(event = other, "ignoring payment notification");
                return Ok(());
            }
        };

        let reference = notification.data.reference.as_str();
        let Some(payment) = self.payments.get_payment_by_reference(reference).await? else {
            warn!(reference, "payment notification for unknown reference");
            return Ok(());
        };
        let Some(booking) = self.bookings.get_booking(payment.booking_id).await? else {
            warn!(reference, booking_id = %payment.booking_id, "payment notification for missing booking");
            return Ok(());
        };

        let amount = notification.data.amount.unwrap_or(payment.amount);
        self.settle(&booking, &payment, status, amount, "webhook").await
    }

    async fn settle(
        &self,
        booking: &Booking,
        payment: &Payment,
        status: PaymentStatus,
        amount: i64,
        source: &str,
    ) -> BookingResult<()> {
        if booking.status.is_final() {
            debug!(booking_id = %booking.id, status = %booking.status, "booking already settled");
            return Ok(());
        }

        let settlement = Settlement::for_payment(status);
        if settlement == Settlement::Confirm && amount != payment.amount {
            warn!(
                booking_id = %booking.id,
                expected = payment.amount,
                received = amount,
                "payment amount mismatch, booking left pending"
            );
            return Ok(());
        }

        if payment.status != status {
            self.payments.update_payment_status(&payment.reference, status).await?;
        }

        let changed = match settlement {
            Settlement::Confirm => self.bookings.confirm_booking(booking.id).await?,
            Settlement::Cancel => self.bookings.cancel_booking(booking.id).await?,
            Settlement::Hold => false,
        };

        if let (true, Some(target)) = (changed, settlement.target()) {
            info!(booking_id = %booking.id, status = %target, source, "booking settled");
            publish_settled(booking, target, source);
        }
        Ok(())
    }
}

fn publish_settled(booking: &Booking, status: BookingStatus, source: &str) {
    let topic = match status {
        BookingStatus::Cancelled => events::BOOKING_CANCELLED,
        _ => events::BOOKING_CONFIRMED,
    };
    events::publish(
        topic,
        &BookingSettledEvent {
            booking_id: booking.id,
            reference: booking.reference.clone(),
            status: status.to_string(),
            source: source.to_string(),
            timestamp: Utc::now().timestamp(),
        },
    );
}

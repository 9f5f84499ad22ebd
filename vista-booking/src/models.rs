use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vista_core::{Booking, Payment};

/// `POST /api/bookings` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    /// Kept as text so an unknown type is reported as invalid input rather than a body rejection.
    pub listing_type: String,
    pub listing_id: Uuid,
    #[serde(default)]
    pub showtime_id: Option<Uuid>,
    #[serde(default)]
    pub check_in: Option<NaiveDate>,
    #[serde(default)]
    pub check_out: Option<NaiveDate>,
    /// Ticket types, or room types for accommodations.
    #[serde(default)]
    pub items: Vec<ItemSelection>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub contact: Option<ContactDetails>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ItemSelection {
    pub unit_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub full_name: Option<String>,
    /// Falls back to the session email.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A booking with its payment record, if one was initialized.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking: Booking,
    pub payment: Option<Payment>,
}

/// Payment gateway notification, already authenticated by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub event: String,
    pub data: PaymentNotificationData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotificationData {
    pub reference: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

use chrono::{DateTime, NaiveDate, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use vista_catalog::{InventoryClaim, LineQuote, ListingType};
use vista_shared::Masked;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Only a pending booking moves, and only to a final state.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed) | (BookingStatus::Pending, BookingStatus::Cancelled)
        )
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub full_name: Option<String>,
    pub email: Masked<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingLine {
    pub unit_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub nights: i32,
    pub gross: i64,
    pub discount: i64,
    pub net: i64,
}

impl From<LineQuote> for BookingLine {
    fn from(q: LineQuote) -> Self {
        Self {
            unit_id: q.unit_id,
            name: q.name,
            unit_price: q.unit_price,
            quantity: q.quantity,
            nights: q.nights,
            gross: q.gross,
            discount: q.discount,
            net: q.net,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub explorer_id: Uuid,
    pub contact: Contact,
    pub listing_type: ListingType,
    pub listing_id: Uuid,
    pub showtime_id: Option<Uuid>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub lines: Vec<BookingLine>,
    pub subtotal: i64,
    pub discount_total: i64,
    pub coupon: Option<AppliedCoupon>,
    pub total: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Inventory taken by this booking. Rooms count once per room, not per night.
    pub fn claims(&self) -> Vec<InventoryClaim> {
        self.lines
            .iter()
            .map(|l| InventoryClaim { unit_id: l.unit_id, quantity: l.quantity })
            .collect()
    }

    pub fn update_status(&mut self, next: BookingStatus) {
        self.status = next;
        self.updated_at = Utc::now();
    }
}

/// `VST-` followed by ten upper-case alphanumerics. Doubles as the payment reference.
pub fn generate_reference() -> String {
    format!("VST-{}", random_suffix(10))
}

/// Fresh gateway reference for a repeated checkout of the same booking.
/// Gateways refuse a reference they have seen before.
pub fn retry_reference(reference: &str) -> String {
    format!("{}-{}", reference, random_suffix(4))
}

fn random_suffix(len: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect();
    suffix.to_ascii_uppercase()
}

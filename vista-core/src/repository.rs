use async_trait::async_trait;
use uuid::Uuid;
use vista_catalog::Listing;

use crate::booking::Booking;
use crate::payment::{Payment, PaymentStatus};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Only {available} left for {unit}, requested {requested}")]
    CapacityExceeded {
        unit: String,
        requested: i32,
        available: i32,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Listing documents with their embedded ticket, room and showtime data.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<Listing>>;

    async fn create_listing(&self, listing: &Listing) -> RepoResult<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// The booking transaction: takes every claim of `booking` against the listing's
    /// inventory and stores the booking, atomically. Fails with
    /// [`RepoError::CapacityExceeded`] and leaves inventory untouched if any claim no longer fits.
    async fn commit_booking(&self, booking: &Booking) -> RepoResult<()>;

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>>;

    /// Newest first.
    async fn list_for_explorer(&self, explorer_id: Uuid) -> RepoResult<Vec<Booking>>;

    /// Newest first.
    async fn list_for_listing(&self, listing_id: Uuid) -> RepoResult<Vec<Booking>>;

    /// `pending -> confirmed`. Returns `false` when the booking was not pending.
    async fn confirm_booking(&self, id: Uuid) -> RepoResult<bool>;

    /// `pending -> cancelled` and gives the booking's inventory back, atomically.
    /// Returns `false` when the booking was not pending.
    async fn cancel_booking(&self, id: Uuid) -> RepoResult<bool>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn save_payment(&self, payment: &Payment) -> RepoResult<()>;

    async fn get_payment_for_booking(&self, booking_id: Uuid) -> RepoResult<Option<Payment>>;

    async fn get_payment_by_reference(&self, reference: &str) -> RepoResult<Option<Payment>>;

    async fn update_payment_status(&self, reference: &str, status: PaymentStatus) -> RepoResult<()>;
}

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;
use vista_catalog::{inventory, InventoryError, Listing};
use vista_core::repository::{BookingRepository, ListingRepository, PaymentRepository, RepoError, RepoResult};
use vista_core::{Booking, BookingStatus, Payment, PaymentStatus};

#[derive(Default)]
struct State {
    listings: HashMap<Uuid, Listing>,
    bookings: HashMap<Uuid, Booking>,
    /// Keyed by booking id; one payment per booking.
    payments: HashMap<Uuid, Payment>,
}

/// Process-local store behind one lock, so every operation is atomic.
/// Backs the service and HTTP tests.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn inventory_err(err: InventoryError) -> RepoError {
    match err {
        InventoryError::InsufficientInventory { unit, requested, available } => {
            RepoError::CapacityExceeded { unit, requested, available }
        }
        InventoryError::NotFound(id) => RepoError::NotFound(format!("inventory unit {}", id)),
        e => RepoError::Conflict(e.to_string()),
    }
}

fn newest_first(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    bookings
}

#[async_trait]
impl ListingRepository for InMemoryStore {
    async fn get_listing(&self, id: Uuid) -> RepoResult<Option<Listing>> {
        Ok(self.state.lock().await.listings.get(&id).cloned())
    }

    async fn create_listing(&self, listing: &Listing) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        if state.listings.contains_key(&listing.id) {
            return Err(RepoError::Conflict(format!("listing {} already exists", listing.id)));
        }
        state.listings.insert(listing.id, listing.clone());
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn commit_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        if state.bookings.values().any(|b| b.reference == booking.reference) {
            return Err(RepoError::Conflict(format!("reference {} already used", booking.reference)));
        }

        let listing = state
            .listings
            .get_mut(&booking.listing_id)
            .ok_or_else(|| RepoError::NotFound(format!("listing {}", booking.listing_id)))?;
        inventory::claim(listing, &booking.claims()).map_err(inventory_err)?;

        state.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn list_for_explorer(&self, explorer_id: Uuid) -> RepoResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state.bookings.values().filter(|b| b.explorer_id == explorer_id).cloned().collect(),
        ))
    }

    async fn list_for_listing(&self, listing_id: Uuid) -> RepoResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state.bookings.values().filter(|b| b.listing_id == listing_id).cloned().collect(),
        ))
    }

    async fn confirm_booking(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        match state.bookings.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Pending => {
                b.update_status(BookingStatus::Confirmed);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(RepoError::NotFound(format!("booking {}", id))),
        }
    }

    async fn cancel_booking(&self, id: Uuid) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        let State { listings, bookings, .. } = &mut *state;

        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("booking {}", id)))?;
        if booking.status != BookingStatus::Pending {
            return Ok(false);
        }

        if let Some(listing) = listings.get_mut(&booking.listing_id) {
            inventory::release(listing, &booking.claims()).map_err(inventory_err)?;
        }
        booking.update_status(BookingStatus::Cancelled);
        Ok(true)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn save_payment(&self, payment: &Payment) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        if state.payments.contains_key(&payment.booking_id) {
            return Err(RepoError::Conflict(format!("booking {} already has a payment", payment.booking_id)));
        }
        state.payments.insert(payment.booking_id, payment.clone());
        Ok(())
    }

    async fn get_payment_for_booking(&self, booking_id: Uuid) -> RepoResult<Option<Payment>> {
        Ok(self.state.lock().await.payments.get(&booking_id).cloned())
    }

    async fn get_payment_by_reference(&self, reference: &str) -> RepoResult<Option<Payment>> {
        let state = self.state.lock().await;
        Ok(state.payments.values().find(|p| p.reference == reference).cloned())
    }

    async fn update_payment_status(&self, reference: &str, status: PaymentStatus) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        let payment = state
            .payments
            .values_mut()
            .find(|p| p.reference == reference)
            .ok_or_else(|| RepoError::NotFound(format!("payment {}", reference)))?;
        payment.status = status;
        payment.updated_at = Utc::now();
        Ok(())
    }
}

use uuid::Uuid;

use crate::listing::{InventoryUnit, Listing};

/// A quantity of one ticket or room type taken by a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryClaim {
    pub unit_id: Uuid,
    pub quantity: i32,
}

/// `sold + requested <= capacity`.
pub fn check_availability<U: InventoryUnit + ?Sized>(unit: &U, requested: i32) -> Result<(), InventoryError> {
    if requested <= 0 {
        return Err(InventoryError::InvalidQuantity(requested));
    }
    let available = unit.remaining();
    if requested > available {
        return Err(InventoryError::InsufficientInventory {
            unit: unit.name().to_string(),
            requested,
            available,
        });
    }
    Ok(())
}

/// Applies every claim to the listing's sold counters, or none of them.
pub fn claim(listing: &mut Listing, claims: &[InventoryClaim]) -> Result<(), InventoryError> {
    let mut staged = listing.clone();
    for c in claims {
        if c.quantity <= 0 {
            return Err(InventoryError::InvalidQuantity(c.quantity));
        }
        let (sold, capacity) = staged
            .unit_counts_mut(c.unit_id)
            .ok_or(InventoryError::NotFound(c.unit_id))?;
        if *sold + c.quantity > capacity {
            return Err(InventoryError::InsufficientInventory {
                unit: c.unit_id.to_string(),
                requested: c.quantity,
                available: (capacity - *sold).max(0),
            });
        }
        *sold += c.quantity;
    }
    *listing = staged;
    Ok(())
}

/// Gives claimed quantities back. Counters never go below zero.
pub fn release(listing: &mut Listing, claims: &[InventoryClaim]) -> Result<(), InventoryError> {
    for c in claims {
        let (sold, _) = listing
            .unit_counts_mut(c.unit_id)
            .ok_or(InventoryError::NotFound(c.unit_id))?;
        *sold = (*sold - c.quantity).max(0);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Ticket or room type not found: {0}")]
    NotFound(Uuid),

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    #[error("Only {available} left for {unit}, requested {requested}")]
    InsufficientInventory {
        unit: String,
        requested: i32,
        available: i32,
    },
}

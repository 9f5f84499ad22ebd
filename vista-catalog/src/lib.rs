pub mod coupon;
pub mod inventory;
pub mod listing;
pub mod pricing;

pub use coupon::Coupon;
pub use inventory::{InventoryClaim, InventoryError};
pub use listing::{
    InventoryUnit, Listing, ListingDetails, ListingDraft, ListingType, RoomType, Showtime, TicketType,
};
pub use pricing::{Discount, DiscountKind, LineQuote, PricingEngine, Totals};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown listing type: {0:?}")]
    UnknownListingType(String),

    #[error("Invalid listing: {0}")]
    InvalidListing(String),

    #[error("Amount is too large to price: {0}")]
    AmountOverflow(String),
}

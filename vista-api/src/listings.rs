use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use vista_catalog::{coupon, Coupon, InventoryUnit, Listing, ListingDetails, ListingType};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/listings/{listing_type}/{id}", get(get_listing))
        .route("/api/coupons/{code}", get(get_coupon))
}

#[derive(Debug, Serialize)]
pub struct UnitAvailability {
    pub unit_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showtime_id: Option<Uuid>,
    pub name: String,
    pub remaining: i32,
}

#[derive(Debug, Serialize)]
pub struct ListingView {
    pub listing: Listing,
    pub availability: Vec<UnitAvailability>,
}

fn availability_of<U: InventoryUnit>(units: &[U], showtime_id: Option<Uuid>) -> impl Iterator<Item = UnitAvailability> + '_ {
    units.iter().map(move |u| UnitAvailability {
        unit_id: u.id(),
        showtime_id,
        name: u.name().to_string(),
        remaining: u.remaining(),
    })
}

fn availability(listing: &Listing) -> Vec<UnitAvailability> {
    match &listing.details {
        ListingDetails::Event { tickets, .. } | ListingDetails::Leisure { tickets, .. } => {
            availability_of(tickets, None).collect()
        }
        ListingDetails::Accommodation { rooms } => availability_of(rooms, None).collect(),
        ListingDetails::Movie { showtimes, .. } => showtimes
            .iter()
            .flat_map(|s| availability_of(&s.tickets, Some(s.id)))
            .collect(),
    }
}

/// GET /api/listings/{listing_type}/{id}
async fn get_listing(
    State(state): State<AppState>,
    path: Result<Path<(String, Uuid)>, PathRejection>,
) -> Result<Json<ListingView>, AppError> {
    let Path((listing_type, id)) = path?;
    let listing_type: ListingType = listing_type
        .parse()
        .map_err(|e: vista_catalog::CatalogError| AppError::InvalidInput(e.to_string()))?;

    let listing = state
        .listings
        .get_listing(id)
        .await?
        .filter(|l| l.is_published && l.listing_type() == listing_type)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", listing_type, id)))?;

    let availability = availability(&listing);
    Ok(Json(ListingView { listing, availability }))
}

/// GET /api/coupons/{code}
async fn get_coupon(Path(code): Path<String>) -> Result<Json<Coupon>, AppError> {
    coupon::lookup(&code)
        .map(Json)
        .ok_or_else(|| AppError::InvalidInput(format!("Coupon code '{}' is not valid", code.trim())))
}

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use vista_catalog::{Listing, ListingDraft};
use vista_core::Booking;

use crate::error::AppError;
use crate::middleware::{vendor_auth_middleware, SessionClaims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/vendor/listings", post(create_listing))
        .route("/api/vendor/listings/{id}/bookings", get(listing_bookings))
        .route_layer(middleware::from_fn_with_state(state, vendor_auth_middleware))
}

/// POST /api/vendor/listings
async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    payload: Result<Json<ListingDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
    let Json(draft) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    draft.validate().map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let listing = draft.into_listing(claims.sub, Utc::now());
    state.listings.create_listing(&listing).await?;
    tracing::info!(listing_id = %listing.id, vendor_id = %claims.sub, listing_type = %listing.listing_type(), "listing created");

    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /api/vendor/listings/{id}/bookings
async fn listing_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.bookings.listing_bookings(&claims.principal(), id).await?))
}

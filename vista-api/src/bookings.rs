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
use uuid::Uuid;
use vista_booking::{BookingReceipt, CreateBookingRequest};
use vista_core::Booking;

use crate::error::AppError;
use crate::middleware::{explorer_auth_middleware, SessionClaims};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_bookings))
        .route("/api/bookings/{id}", get(get_booking))
        .route("/api/bookings/{id}/verify", post(verify_booking))
        .route("/api/bookings/{id}/pay", post(pay_booking))
        .route("/api/bookings/{id}/cancel", post(cancel_booking))
        .route_layer(middleware::from_fn_with_state(state, explorer_auth_middleware))
}

/// POST /api/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let Json(req) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let receipt = state.bookings.create_booking(&claims.principal(), req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_bookings(&claims.principal()).await?))
}

/// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingReceipt>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.bookings.get_booking(&claims.principal(), id).await?))
}

/// POST /api/bookings/{id}/verify
/// Called when the hosted checkout reports success.
async fn verify_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingReceipt>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.bookings.verify_payment(&claims.principal(), id).await?))
}

/// POST /api/bookings/{id}/pay
async fn pay_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingReceipt>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.bookings.resume_payment(&claims.principal(), id).await?))
}

/// POST /api/bookings/{id}/cancel
/// Called when the explorer closes or cancels the hosted checkout.
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingReceipt>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.bookings.cancel_booking(&claims.principal(), id).await?))
}

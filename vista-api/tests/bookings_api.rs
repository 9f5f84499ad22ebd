//! HTTP-level tests for the booking flow: checkout, callbacks, webhooks, and error codes.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{
    body_json, build_test_app, expired_token, get, get_auth, post_auth, post_json, post_json_auth, seed_event, send,
    token_for, PAYMENT_SECRET,
};
use serde_json::json;
use uuid::Uuid;
use vista_core::Role;
use vista_store::paystack::{sign, SIGNATURE_HEADER};

fn checkout(listing_id: Uuid, ticket_id: Uuid, quantity: i32) -> serde_json::Value {
    json!({
        "listing_type": "event",
        "listing_id": listing_id,
        "items": [{ "unit_id": ticket_id, "quantity": quantity }]
    })
}

fn signed_webhook(body: &serde_json::Value, secret: &str) -> Request<Body> {
    let raw = body.to_string();
    Request::builder()
        .method(Method::POST)
        .uri("/api/webhooks/payments")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign(secret, raw.as_bytes()))
        .body(Body::from(raw))
        .unwrap()
}

#[tokio::test]
async fn test_create_booking_returns_booking_and_payment() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 50).await;
    let token = token_for(Uuid::new_v4(), Role::Explorer);

    let response = post_json_auth(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 3), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["booking"]["status"], "pending");
    assert_eq!(json["booking"]["listing_type"], "event");
    assert_eq!(json["booking"]["total"], 6000);
    assert_eq!(json["booking"]["contact"]["email"], "explorer@example.com");
    assert_eq!(json["payment"]["status"], "pending");
    assert_eq!(json["payment"]["reference"], json["booking"]["reference"]);
    assert!(json["payment"]["authorization_url"].is_string());
}

#[tokio::test]
async fn test_coupon_reduces_total() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 50).await;
    let token = token_for(Uuid::new_v4(), Role::Explorer);

    let mut body = checkout(listing.id, ticket, 5);
    body["coupon_code"] = json!("welcome10");
    let response = post_json_auth(app.router.clone(), "/api/bookings", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["booking"]["subtotal"], 10_000);
    assert_eq!(json["booking"]["coupon"]["code"], "WELCOME10");
    assert_eq!(json["booking"]["coupon"]["discount"], 1_000);
    assert_eq!(json["booking"]["total"], 9_000);
}

#[tokio::test]
async fn test_session_is_required_and_must_be_an_explorer() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 50).await;

    let response = post_json(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let response = post_json_auth(
        app.router.clone(),
        "/api/bookings",
        checkout(listing.id, ticket, 1),
        &expired_token(Uuid::new_v4()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json_auth(
        app.router.clone(),
        "/api/bookings",
        checkout(listing.id, ticket, 1),
        &token_for(Uuid::new_v4(), Role::Vendor),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_error_codes() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 4).await;
    let token = token_for(Uuid::new_v4(), Role::Explorer);

    let mut body = checkout(listing.id, ticket, 1);
    body["listing_type"] = json!("spaceflight");
    let response = post_json_auth(app.router.clone(), "/api/bookings", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_INPUT");

    let response =
        post_json_auth(app.router.clone(), "/api/bookings", checkout(Uuid::new_v4(), ticket, 1), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = post_json_auth(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 5), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BOOKING_FAILED");
    assert!(json["error"].as_str().unwrap().contains("Only 4 left"));

    let response = post_json_auth(app.router.clone(), "/api/bookings", json!({ "items": "lots" }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_signed_webhook_confirms_booking() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 50).await;
    let token = token_for(Uuid::new_v4(), Role::Explorer);

    let created = body_json(
        post_json_auth(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 2), &token).await,
    )
    .await;
    let booking_id = created["booking"]["id"].as_str().unwrap().to_string();
    let event = json!({
        "event": "charge.success",
        "data": {
            "reference": created["booking"]["reference"],
            "status": "success",
            "amount": 4000,
            "currency": "NGN"
        }
    });

    let forged = send(app.router.clone(), signed_webhook(&event, "sk_wrong")).await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    let response = send(app.router.clone(), signed_webhook(&event, PAYMENT_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);
    // replay
    let response = send(app.router.clone(), signed_webhook(&event, PAYMENT_SECRET)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get_auth(app.router.clone(), &format!("/api/bookings/{booking_id}"), &token).await).await;
    assert_eq!(json["booking"]["status"], "confirmed");
    assert_eq!(json["payment"]["status"], "success");
}

#[tokio::test]
async fn test_unsigned_webhook_rejected() {
    let app = build_test_app();
    let response = post_json(
        app.router.clone(),
        "/api/webhooks/payments",
        json!({ "event": "charge.success", "data": { "reference": "VST-X" } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_and_cancel_callbacks() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 10).await;
    let token = token_for(Uuid::new_v4(), Role::Explorer);

    let first = body_json(
        post_json_auth(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 2), &token).await,
    )
    .await;
    let first_id = first["booking"]["id"].as_str().unwrap().to_string();
    let verified = post_auth(app.router.clone(), &format!("/api/bookings/{first_id}/verify"), &token).await;
    assert_eq!(verified.status(), StatusCode::OK);
    assert_eq!(body_json(verified).await["booking"]["status"], "confirmed");

    let second = body_json(
        post_json_auth(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 5), &token).await,
    )
    .await;
    let second_id = second["booking"]["id"].as_str().unwrap().to_string();
    let cancelled = post_auth(app.router.clone(), &format!("/api/bookings/{second_id}/cancel"), &token).await;
    assert_eq!(cancelled.status(), StatusCode::OK);
    let json = body_json(cancelled).await;
    assert_eq!(json["booking"]["status"], "cancelled");
    assert_eq!(json["payment"]["status"], "abandoned");

    // confirmed bookings cannot be cancelled from the checkout callback
    let response = post_auth(app.router.clone(), &format!("/api/bookings/{first_id}/cancel"), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let view = body_json(get(app.router.clone(), &format!("/api/listings/event/{}", listing.id)).await).await;
    assert_eq!(view["availability"][0]["remaining"], 8);
}

#[tokio::test]
async fn test_explorers_only_see_their_own_bookings() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 10).await;
    let owner = token_for(Uuid::new_v4(), Role::Explorer);
    let stranger = token_for(Uuid::new_v4(), Role::Explorer);

    let created = body_json(
        post_json_auth(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 1), &owner).await,
    )
    .await;
    let id = created["booking"]["id"].as_str().unwrap().to_string();

    let response = get_auth(app.router.clone(), &format!("/api/bookings/{id}"), &stranger).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mine = body_json(get_auth(app.router.clone(), "/api/bookings", &owner).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let theirs = body_json(get_auth(app.router.clone(), "/api/bookings", &stranger).await).await;
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pay_retries_after_gateway_outage() {
    let app = build_test_app();
    let (listing, ticket) = seed_event(&app.store, 2000, 10).await;
    let token = token_for(Uuid::new_v4(), Role::Explorer);

    app.gateway.set_failing(true);
    let response = post_json_auth(app.router.clone(), "/api/bookings", checkout(listing.id, ticket, 1), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(created["payment"].is_null());
    let id = created["booking"]["id"].as_str().unwrap().to_string();

    let response = post_auth(app.router.clone(), &format!("/api/bookings/{id}/pay"), &token).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "SERVER_ERROR");

    app.gateway.set_failing(false);
    let response = post_auth(app.router.clone(), &format!("/api/bookings/{id}/pay"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["payment"]["status"], "pending");
}

#[tokio::test]
async fn test_malformed_booking_id_is_invalid_input() {
    let app = build_test_app();
    let token = token_for(Uuid::new_v4(), Role::Explorer);

    let response = get_auth(app.router.clone(), "/api/bookings/not-a-uuid", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_INPUT");

    for action in ["verify", "pay", "cancel"] {
        let response = post_auth(app.router.clone(), &format!("/api/bookings/nope/{action}"), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_INPUT");
    }
}

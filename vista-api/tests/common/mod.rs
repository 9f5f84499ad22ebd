#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use uuid::Uuid;
use vista_api::middleware::SessionClaims;
use vista_api::{app, AppState, AuthConfig};
use vista_booking::{BookingService, CheckoutRules, PaymentOrchestrator};
use vista_catalog::{Listing, ListingDetails, TicketType};
use vista_core::{ListingRepository, Role};
use vista_store::{InMemoryStore, MockPaymentGateway, RedisClient};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const PAYMENT_SECRET: &str = "sk_test_webhook";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<MockPaymentGateway>,
}

/// The real router over in-memory repositories and the mock gateway, without Redis.
pub fn build_test_app() -> TestApp {
    build_test_app_with(None, 120)
}

pub fn build_test_app_with(redis: Option<Arc<RedisClient>>, requests_per_minute: i64) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let gateway = Arc::new(MockPaymentGateway::new());

    let service = BookingService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        PaymentOrchestrator::new(gateway.clone(), None),
        CheckoutRules::default(),
    );

    let state = AppState {
        listings: store.clone(),
        bookings: Arc::new(service),
        redis,
        auth: AuthConfig {
            secret: JWT_SECRET.to_string(),
        },
        payment_secret: PAYMENT_SECRET.to_string(),
        requests_per_minute,
    };

    TestApp {
        router: app(state),
        store,
        gateway,
    }
}

pub fn token_for(user_id: Uuid, role: Role) -> String {
    let claims = SessionClaims {
        sub: user_id,
        email: format!("{}@example.com", role),
        role,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

pub fn expired_token(user_id: Uuid) -> String {
    let claims = SessionClaims {
        sub: user_id,
        email: "late@example.com".to_string(),
        role: Role::Explorer,
        exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

/// A published event a week out with one ticket type.
pub async fn seed_event(store: &InMemoryStore, price: i64, capacity: i32) -> (Listing, Uuid) {
    let ticket_id = Uuid::new_v4();
    let listing = Listing {
        id: Uuid::new_v4(),
        vendor_id: Uuid::new_v4(),
        title: "Lagos Jazz Night".to_string(),
        description: Some("Live music by the lagoon".to_string()),
        location: Some("Lagos".to_string()),
        currency: "NGN".to_string(),
        is_published: true,
        created_at: Utc::now(),
        details: ListingDetails::Event {
            starts_at: Utc::now() + Duration::days(7),
            ends_at: None,
            tickets: vec![TicketType {
                id: ticket_id,
                name: "Regular".to_string(),
                price,
                capacity,
                sold_count: 0,
                discount: None,
            }],
        },
    };
    store.create_listing(&listing).await.unwrap();
    (listing, ticket_id)
}

pub async fn send(app: Router, req: Request<Body>) -> Response {
    app.oneshot(req).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let req = Request::get(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: serde_json::Value, token: &str) -> Response {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

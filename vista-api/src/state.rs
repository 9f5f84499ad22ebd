use std::sync::Arc;
use vista_booking::BookingService;
use vista_core::ListingRepository;
use vista_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<dyn ListingRepository>,
    pub bookings: Arc<BookingService>,
    /// `None` disables rate limiting.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    /// Key the payment gateway signs webhooks with.
    pub payment_secret: String,
    pub requests_per_minute: i64,
}

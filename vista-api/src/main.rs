use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vista_api::{app, AppState, AuthConfig};
use vista_booking::{BookingService, CheckoutRules, PaymentOrchestrator};
use vista_core::PaymentGateway;
use vista_store::{
    Config, DbClient, MockPaymentGateway, PaystackGateway, PgBookingRepository, PgListingRepository,
    PgPaymentRepository, RedisClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vista_api=debug,vista_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Vista API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let redis = match &config.redis {
        Some(redis) => Some(Arc::new(
            RedisClient::new(&redis.url).await.context("Invalid Redis URL")?,
        )),
        None => {
            tracing::warn!("No Redis configured, rate limiting disabled");
            None
        }
    };

    let gateway: Arc<dyn PaymentGateway> = if config.payment.secret_key.is_empty() {
        tracing::warn!("No payment secret key configured, using the mock payment gateway");
        Arc::new(MockPaymentGateway::new())
    } else {
        Arc::new(PaystackGateway::new(&config.payment.base_url, &config.payment.secret_key)?)
    };

    let listings = Arc::new(PgListingRepository::new(db.pool.clone()));
    let service = BookingService::new(
        listings.clone(),
        Arc::new(PgBookingRepository::new(db.pool.clone())),
        Arc::new(PgPaymentRepository::new(db.pool.clone())),
        PaymentOrchestrator::new(gateway, config.payment.callback_url.clone()),
        CheckoutRules {
            max_quantity_per_line: config.booking.max_quantity_per_line,
            max_nights: config.booking.max_nights,
        },
    );

    let app_state = AppState {
        listings,
        bookings: Arc::new(service),
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        payment_secret: config.payment.secret_key.clone(),
        requests_per_minute: config.rate_limit.requests_per_minute,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app(app_state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub mod app_config;
pub mod booking_repo;
pub mod database;
#[cfg(test)]
mod fixtures;
pub mod listing_repo;
pub mod memory;
pub mod mock_gateway;
pub mod payment_repo;
pub mod paystack;
pub mod redis_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use listing_repo::PgListingRepository;
pub use memory::InMemoryStore;
pub use mock_gateway::MockPaymentGateway;
pub use payment_repo::PgPaymentRepository;
pub use paystack::PaystackGateway;
pub use redis_repo::RedisClient;

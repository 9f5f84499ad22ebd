use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Rate limiting is off when no Redis is configured.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
    #[serde(default)]
    pub booking: BookingRules,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub base_url: String,
    /// Empty selects the mock gateway.
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    pub max_quantity_per_line: i32,
    pub max_nights: i64,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            max_quantity_per_line: 20,
            max_nights: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests_per_minute: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { requests_per_minute: 120 }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `VISTA__PAYMENT__SECRET_KEY=sk_test_...`
            .add_source(config::Environment::with_prefix("VISTA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

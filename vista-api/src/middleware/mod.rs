pub mod auth;
pub mod rate_limit;

pub use auth::{explorer_auth_middleware, vendor_auth_middleware, SessionClaims};
pub use rate_limit::rate_limit_middleware;

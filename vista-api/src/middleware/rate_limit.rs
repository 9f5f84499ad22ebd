use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;

use crate::state::AppState;

/// Per-IP fixed window of one minute. Fails open when Redis errors.
pub async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(redis) = state.redis.as_ref() else {
        return next.run(req).await;
    };

    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = format!("ratelimit:{}", ip);

    match redis.check_rate_limit(&key, state.requests_per_minute, 60).await {
        Ok(true) => next.run(req).await,
        Ok(false) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests, slow down", "code": "RATE_LIMITED" })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "rate limiter unavailable, allowing request");
            next.run(req).await
        }
    }
}

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Requests allowed per client IP per window.
pub const RATE_LIMIT: i64 = 100;
pub const RATE_WINDOW_SECONDS: i64 = 60;

/// Fixed-window limit per client IP. Passes everything through when Redis
/// is absent or unreachable.
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

    match redis.check_rate_limit(&key, RATE_LIMIT, RATE_WINDOW_SECONDS).await {
        Ok(true) => next.run(req).await,
        Ok(false) => AppError::RateLimited.into_response(),
        Err(e) => {
            warn!("Rate limiter unavailable, failing open: {}", e);
            next.run(req).await
        }
    }
}

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod chat;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod search;
pub mod speech;
pub mod state;
pub mod trip_plans;

pub use state::{AppState, Providers};

/// Room for a 10 MiB audio upload plus the other form fields.
const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            HeaderName::from_static(middleware::auth::APPWRITE_JWT_HEADER),
        ]);

    let protected = Router::new()
        .merge(bookings::routes())
        .merge(trip_plans::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(chat::routes())
        .merge(search::routes())
        .merge(speech::routes())
        .merge(protected)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

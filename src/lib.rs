//! Elysia - residential concierge service
//!
//! Accepts structured resident requests, classifies their urgency, generates
//! a natural-language reply through one of several interchangeable
//! generation backends, and tracks active requests in a bounded registry.

pub mod backend;
pub mod cli;
pub mod concierge;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod policy;
pub mod property;
pub mod request;
pub mod telemetry;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the HTTP application around prepared state
pub fn app(state: handlers::AppState) -> Router {
    Router::new()
        .route("/", get(handlers::info::root))
        .route("/health", get(handlers::health::handler))
        .route("/metrics", get(handlers::metrics::handler))
        .route("/api/elysia/request", post(handlers::request::handler))
        .route("/api/elysia/amenities", get(handlers::info::amenities))
        .route(
            "/api/elysia/amenities/{amenity}/availability",
            get(handlers::info::availability),
        )
        .route("/api/elysia/community", get(handlers::info::community))
        .route(
            "/api/elysia/status/{request_id}",
            get(handlers::status::handler),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

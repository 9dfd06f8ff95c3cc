//! Route modules for the fulltext server

pub mod health;
pub mod presentation;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Seconds a browser may cache a CORS preflight result
const CORS_MAX_AGE: u64 = 600;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/presentation", presentation::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Read-only CORS policy: GET and HEAD with precondition headers.
///
/// Any origin is allowed, so the layer adds no `Vary` of its own and a 412
/// stays free of representation headers.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers([
            header::IF_MATCH,
            header::IF_NONE_MATCH,
            header::IF_MODIFIED_SINCE,
        ])
        .expose_headers([
            header::ALLOW,
            header::ETAG,
            header::LAST_MODIFIED,
            header::LINK,
        ])
        .max_age(Duration::from_secs(CORS_MAX_AGE))
        .vary(Vec::<HeaderName>::new())
}

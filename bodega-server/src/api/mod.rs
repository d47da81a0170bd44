//! API routes
//!
//! # Structure
//!
//! - [`health`] - liveness checks
//! - [`web_orders`] - web order lifecycle operations

pub mod health;
pub mod web_orders;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(web_orders::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

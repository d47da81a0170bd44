//! Web order API
//!
//! Every mutation goes through the lifecycle manager; handlers only map
//! the wire shape. Side effects run after the response is sent.

mod handler;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::ServerState;

/// Web order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/web-orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/number/{number}", get(handler::get_by_number))
        .route("/{id}/approve", post(handler::approve))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/pickup", post(handler::mark_picked_up))
        .route("/{id}/feedback", get(handler::get_feedback))
}

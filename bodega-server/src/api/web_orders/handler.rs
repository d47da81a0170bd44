//! Web order API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::error::{AppError, AppResult};
use shared::models::{Order, OrderFeedback};

use crate::core::ServerState;
use crate::orders::{CreateOrderRequest, PickupFeedback, StatusUpdate};

/// Create a new web order
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<Order>> {
    let order = state.lifecycle.create_order(payload)?;
    Ok(Json(order))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.lifecycle.get_order(&id)?;
    Ok(Json(order))
}

/// Get order by its human-readable number
pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(number): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state
        .lifecycle
        .find_by_number(&number)?
        .ok_or_else(|| AppError::not_found(format!("Order {number} not found")))?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub send_payment_verified: bool,
}

/// Approve a pending order
pub async fn approve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ApproveRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .lifecycle
        .approve(&id, payload.send_payment_verified)?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Reject a pending order with a reason
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<Order>> {
    let order = state.lifecycle.reject(&id, &payload.reason)?;
    Ok(Json(order))
}

/// Generic status update
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<Order>> {
    let order = state.lifecycle.update_status(&id, payload)?;
    Ok(Json(order))
}

/// Complete a pickup order, recording feedback
pub async fn mark_picked_up(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<PickupFeedback>,
) -> AppResult<Json<Order>> {
    let order = state.lifecycle.mark_picked_up(&id, payload)?;
    Ok(Json(order))
}

/// Feedback recorded at pickup, if any
pub async fn get_feedback(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderFeedback>> {
    let feedback = state
        .lifecycle
        .get_feedback(&id)?
        .ok_or_else(|| AppError::not_found(format!("No feedback for order {id}")))?;
    Ok(Json(feedback))
}

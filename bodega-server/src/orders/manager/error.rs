use crate::db::StorageError;
use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

/// Lifecycle errors
///
/// Everything here is surfaced synchronously, before any state mutation
/// commits. Post-commit pipeline failures never appear as a variant.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Order total does not match its items: {0}")]
    TotalMismatch(String),

    #[error("Cannot {action} an order in state '{current}'")]
    InvalidState {
        current: OrderStatus,
        action: &'static str,
    },

    #[error("'{0}' is not an allowed order status")]
    InvalidStatus(String),

    #[error("Order {0} is already closed")]
    AlreadyClosed(String),

    #[error("Operation only applies to pickup orders")]
    PickupOrderRequired,

    #[error("Feedback already recorded for order {0}")]
    FeedbackAlreadyRecorded(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::Validation(_) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
            }
            LifecycleError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            LifecycleError::TotalMismatch(_) => {
                AppError::with_message(ErrorCode::OrderTotalMismatch, message)
            }
            LifecycleError::InvalidState { current, action } => {
                AppError::with_message(ErrorCode::InvalidOrderState, message)
                    .with_detail("current_status", current.as_str())
                    .with_detail("action", action)
            }
            LifecycleError::InvalidStatus(status) => {
                AppError::with_message(ErrorCode::InvalidOrderStatus, message)
                    .with_detail("status", status)
            }
            LifecycleError::AlreadyClosed(_) => {
                AppError::with_message(ErrorCode::OrderAlreadyClosed, message)
            }
            LifecycleError::PickupOrderRequired => AppError::new(ErrorCode::PickupOrderRequired),
            LifecycleError::FeedbackAlreadyRecorded(_) => {
                AppError::with_message(ErrorCode::FeedbackAlreadyRecorded, message)
            }
            LifecycleError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            LifecycleError::Storage(e) => AppError::database(e.to_string()),
        }
    }
}

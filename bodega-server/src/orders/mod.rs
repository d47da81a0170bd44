//! Web order lifecycle

pub mod manager;

pub use manager::{
    CreateOrderRequest, LifecycleError, LifecycleResult, OrderItemInput, OrderLifecycleManager,
    PickupFeedback, StatusUpdate,
};

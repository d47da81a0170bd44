//! Shared types for the Bodega minimarket backend
//!
//! This crate carries everything the server and its tooling need to agree
//! on:
//!
//! - **Models** (`models`): web orders, order items, pickup feedback and
//!   store branding.
//! - **Errors** (`error`): unified [`ErrorCode`] / [`AppError`] system and
//!   the [`ApiResponse`] envelope used by every HTTP endpoint.

pub mod error;
pub mod models;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{Order, OrderFeedback, OrderItem, OrderStatus, ShippingMethod, StoreInfo};

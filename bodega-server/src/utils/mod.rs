//! Shared helpers: logging setup and input validation

pub mod logger;
pub mod validation;

pub use logger::init_logger;

// Re-export error types from shared for handler code
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

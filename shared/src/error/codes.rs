//! Unified error codes for the Bodega backend
//!
//! Error codes are shared between the server and the storefront/admin
//! frontends. They are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order lifecycle errors
//! - 5xxx: Document rendering errors
//! - 6xxx: Notification delivery errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient
/// serialization and cross-language compatibility (Rust, TypeScript).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order lifecycle ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no line items
    OrderEmpty = 4002,
    /// Order is not in the state required by the transition
    InvalidOrderState = 4003,
    /// Status value is not in the allowed transition list
    InvalidOrderStatus = 4004,
    /// Order is already in a terminal state
    OrderAlreadyClosed = 4005,
    /// Operation only valid for pickup orders
    PickupOrderRequired = 4006,
    /// Feedback has already been recorded for this order
    FeedbackAlreadyRecorded = 4007,
    /// Order totals do not add up
    OrderTotalMismatch = 4008,

    // ==================== 5xxx: Document rendering ====================
    /// Document template is disabled by configuration
    TemplateDisabled = 5001,
    /// Document rendering failed
    RenderFailed = 5002,
    /// Document has no content to render
    EmptyDocument = 5003,

    // ==================== 6xxx: Notification delivery ====================
    /// All delivery channels failed
    DeliveryFailed = 6001,
    /// Attachment could not be read
    AttachmentUnavailable = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order lifecycle
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order has no line items",
            ErrorCode::InvalidOrderState => "Order is not in the required state",
            ErrorCode::InvalidOrderStatus => "Status value is not allowed",
            ErrorCode::OrderAlreadyClosed => "Order is already in a terminal state",
            ErrorCode::PickupOrderRequired => "Operation only valid for pickup orders",
            ErrorCode::FeedbackAlreadyRecorded => "Feedback has already been recorded",
            ErrorCode::OrderTotalMismatch => "Order totals do not add up",

            // Document rendering
            ErrorCode::TemplateDisabled => "Document template is disabled",
            ErrorCode::RenderFailed => "Document rendering failed",
            ErrorCode::EmptyDocument => "Document has no content to render",

            // Notification delivery
            ErrorCode::DeliveryFailed => "All delivery channels failed",
            ErrorCode::AttachmentUnavailable => "Attachment could not be read",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),
            6 => Ok(Self::InvalidFormat),
            7 => Ok(Self::RequiredField),
            8 => Ok(Self::ValueOutOfRange),
            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::OrderEmpty),
            4003 => Ok(Self::InvalidOrderState),
            4004 => Ok(Self::InvalidOrderStatus),
            4005 => Ok(Self::OrderAlreadyClosed),
            4006 => Ok(Self::PickupOrderRequired),
            4007 => Ok(Self::FeedbackAlreadyRecorded),
            4008 => Ok(Self::OrderTotalMismatch),
            5001 => Ok(Self::TemplateDisabled),
            5002 => Ok(Self::RenderFailed),
            5003 => Ok(Self::EmptyDocument),
            6001 => Ok(Self::DeliveryFailed),
            6002 => Ok(Self::AttachmentUnavailable),
            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::NetworkError),
            9004 => Ok(Self::TimeoutError),
            9005 => Ok(Self::ConfigError),
            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.code(), self.message())
    }
}

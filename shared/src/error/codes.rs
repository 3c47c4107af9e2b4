//! Unified error codes for the fulfillment backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product / inventory errors
//! - 7xxx: Delivery errors
//! - 8xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
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
    /// Required field missing
    RequiredField = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been completed
    OrderAlreadyCompleted = 4002,
    /// Transition not legal from the order's current status
    OrderInvalidState = 4003,
    /// Cancellation window has elapsed
    CancelDeadlinePassed = 4004,
    /// Cancellation reason is required
    CancelReasonRequired = 4005,
    /// Order has no items
    OrderEmpty = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment source is not in a paid/chargeable state
    PaymentNotPaid = 5002,
    /// Gateway amount does not match the computed total
    PaymentAmountMismatch = 5003,
    /// Invalid payment method
    PaymentInvalidMethod = 5004,

    // ==================== 6xxx: Product / Inventory ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product is inactive
    ProductInactive = 6002,
    /// Insufficient stock for the requested quantity
    InsufficientStock = 6003,

    // ==================== 7xxx: Delivery ====================
    /// Task no longer available or already assigned (lost race)
    TaskUnavailable = 7001,
    /// Rider already holds an active task
    RiderBusy = 7002,
    /// Order is not assigned to this rider
    TaskNotAssigned = 7003,
    /// Proof photo missing or leg already validated
    ProofNotValidatable = 7004,

    // ==================== 71xx: Proof Upload ====================
    /// File too large
    FileTooLarge = 7101,
    /// Unsupported file format
    UnsupportedFileFormat = 7102,
    /// No file provided in request
    NoFileProvided = 7103,
    /// Empty file provided
    EmptyFile = 7104,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,
    /// Rider profile not found
    RiderNotFound = 8002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Upstream collaborator (payment gateway, image store) failed
    UpstreamError = 9004,
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
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderInvalidState => "Operation not allowed from the order's current status",
            ErrorCode::CancelDeadlinePassed => "Cancellation deadline has passed",
            ErrorCode::CancelReasonRequired => "Cancellation reason is required",
            ErrorCode::OrderEmpty => "Order has no items",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentNotPaid => "Payment has not been confirmed",
            ErrorCode::PaymentAmountMismatch => "Payment amount does not match order total",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",

            // Product / Inventory
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInactive => "Product is no longer available",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // Delivery
            ErrorCode::TaskUnavailable => "Task no longer available or already assigned",
            ErrorCode::RiderBusy => "Rider already has an active delivery",
            ErrorCode::TaskNotAssigned => "Task not found",
            ErrorCode::ProofNotValidatable => "Proof missing or already validated",

            // Proof Upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::RiderNotFound => "Rider profile not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::UpstreamError => "Upstream service failed",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
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
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyCompleted),
            4003 => Ok(ErrorCode::OrderInvalidState),
            4004 => Ok(ErrorCode::CancelDeadlinePassed),
            4005 => Ok(ErrorCode::CancelReasonRequired),
            4006 => Ok(ErrorCode::OrderEmpty),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentNotPaid),
            5003 => Ok(ErrorCode::PaymentAmountMismatch),
            5004 => Ok(ErrorCode::PaymentInvalidMethod),

            // Product / Inventory
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInactive),
            6003 => Ok(ErrorCode::InsufficientStock),

            // Delivery
            7001 => Ok(ErrorCode::TaskUnavailable),
            7002 => Ok(ErrorCode::RiderBusy),
            7003 => Ok(ErrorCode::TaskNotAssigned),
            7004 => Ok(ErrorCode::ProofNotValidatable),

            // Proof Upload
            7101 => Ok(ErrorCode::FileTooLarge),
            7102 => Ok(ErrorCode::UnsupportedFileFormat),
            7103 => Ok(ErrorCode::NoFileProvided),
            7104 => Ok(ErrorCode::EmptyFile),

            // User
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::RiderNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::UpstreamError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// The primary error type across the backend, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an unauthorized error
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create a permission denied error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create an invalid request error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create an invalid token error
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    /// Create a token expired error
    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    /// Create an upstream collaborator error (payment gateway, image store)
    pub fn upstream(service: &str, msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::UpstreamError, msg).with_detail("service", service)
    }

    /// Create an insufficient stock error naming the product and quantities
    pub fn insufficient_stock(product: impl Into<String>, available: i64, requested: i64) -> Self {
        let p = product.into();
        Self::with_message(
            ErrorCode::InsufficientStock,
            format!(
                "Insufficient stock for {}. Available: {}, Requested: {}",
                p, available, requested
            ),
        )
        .with_detail("product", p)
        .with_detail("available", available)
        .with_detail("requested", requested)
    }

    /// Create an invalid state error for an illegal transition
    pub fn invalid_state(from: &str, operation: &str) -> Self {
        Self::with_message(
            ErrorCode::OrderInvalidState,
            format!("Cannot {} an order in status '{}'", operation, from),
        )
        .with_detail("status", from)
        .with_detail("operation", operation)
    }
}

/// Unified API response structure
///
/// Provides a consistent response format for all API endpoints:
/// - `code`: Error code (0 for success)
/// - `message`: Human-readable message
/// - `data`: Response payload (on success)
/// - `details`: Additional error details (on failure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Error code (0 for success, non-zero for errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    /// Human-readable message
    pub message: String,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Additional error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// Create a success response with custom message and data
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(0),
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response without data
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::<()>::error(&self);

        // Log system errors
        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        use super::codes::ErrorCode;
        use axum::Json;

        let status = if self.code == Some(0) || self.code.is_none() {
            http::StatusCode::OK
        } else {
            ErrorCode::try_from(self.code.unwrap_or(1))
                .map(|c| c.http_status())
                .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
        };

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "shipping_address")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "shipping_address");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_insufficient_stock_details() {
        let err = AppError::insufficient_stock("Arabica Beans", 2, 5);
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Insufficient stock for Arabica Beans. Available: 2, Requested: 5"
        );
        let details = err.details.unwrap();
        assert_eq!(details.get("available").unwrap(), 2);
        assert_eq!(details.get("requested").unwrap(), 5);
    }

    #[test]
    fn test_invalid_state_message() {
        let err = AppError::invalid_state("completed", "cancel");
        assert_eq!(err.code, ErrorCode::OrderInvalidState);
        assert_eq!(err.message, "Cannot cancel an order in status 'completed'");
    }

    #[test]
    fn test_app_error_http_status() {
        assert_eq!(
            AppError::new(ErrorCode::OrderNotFound).http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::new(ErrorCode::TaskUnavailable).http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::unauthorized().http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert_eq!(response.code, Some(0));
        assert_eq!(response.message, "OK");
        assert_eq!(response.data, Some(42));
        assert!(response.details.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let err = AppError::with_message(ErrorCode::OrderNotFound, "Order not found")
            .with_detail("id", "ORD-123");
        let response = ApiResponse::<()>::error(&err);

        assert_eq!(response.code, Some(4001));
        assert_eq!(response.message, "Order not found");
        assert!(response.data.is_none());
        assert!(response.details.is_some());
    }

    #[test]
    fn test_api_response_serialize() {
        let response = ApiResponse::success("hello");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":0"));
        assert!(json.contains("\"data\":\"hello\""));
    }
}

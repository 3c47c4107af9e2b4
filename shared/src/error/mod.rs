//! Unified error system
//!
//! - [`ErrorCode`]: standardized error codes for all error types
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`AppError`]: rich error type with codes, messages, and details
//! - [`ApiResponse`]: unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product / inventory errors
//! - 7xxx: Delivery errors
//! - 8xxx: User errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::OrderNotFound);
//! let err = AppError::with_message(ErrorCode::ValidationFailed, "Invalid quantity");
//! let err = AppError::insufficient_stock("Arabica Beans", 2, 5);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};

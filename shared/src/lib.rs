//! Shared types for the Brewhaul fulfillment backend
//!
//! Common types used across crates: error codes, the application error
//! type, the unified API response envelope, and the domain models for
//! orders, products and users.

pub mod error;
pub mod models;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};

//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 4xxx: Order errors
/// - 5xxx: Payment errors
/// - 6xxx: Product / inventory errors
/// - 7xxx: Delivery errors
/// - 8xxx: User errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Order errors (4xxx)
    Order,
    /// Payment errors (5xxx)
    Payment,
    /// Product / inventory errors (6xxx)
    Product,
    /// Delivery errors (7xxx)
    Delivery,
    /// User errors (8xxx)
    User,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..4000 => Self::Permission,
            4000..5000 => Self::Order,
            5000..6000 => Self::Payment,
            6000..7000 => Self::Product,
            7000..8000 => Self::Delivery,
            8000..9000 => Self::User,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Order => "order",
            Self::Payment => "payment",
            Self::Product => "product",
            Self::Delivery => "delivery",
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCode::NotFound.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::TokenExpired.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::OrderNotFound.category(), ErrorCategory::Order);
        assert_eq!(
            ErrorCode::InsufficientStock.category(),
            ErrorCategory::Product
        );
        assert_eq!(ErrorCode::RiderBusy.category(), ErrorCategory::Delivery);
        assert_eq!(ErrorCode::UpstreamError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_name() {
        assert_eq!(ErrorCategory::Delivery.name(), "delivery");
        assert_eq!(ErrorCategory::System.name(), "system");
    }
}

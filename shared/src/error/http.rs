//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::TaskNotAssigned
            | Self::ProofNotValidatable
            | Self::UserNotFound
            | Self::RiderNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::OrderAlreadyCompleted
            | Self::TaskUnavailable
            | Self::RiderBusy => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleRequired | Self::AdminRequired => {
                StatusCode::FORBIDDEN
            }

            // 502 Bad Gateway (payment gateway / image store failure)
            Self::UpstreamError => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 413 Payload Too Large
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::TaskUnavailable.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::RiderBusy.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ErrorCode::UpstreamError.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::InsufficientStock.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::CancelDeadlinePassed.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}

//! Authentication middleware
//!
//! Axum middleware for JWT authentication and role gating.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::security_log;
use shared::models::Role;
use shared::{AppError, ErrorCode};

/// Authentication middleware - requires a logged-in user
///
/// Extracts and validates the JWT from `Authorization: Bearer <token>`,
/// then injects [`CurrentUser`] into the request extensions.
///
/// # Paths that skip authentication
///
/// - `OPTIONS *` (CORS preflight)
/// - non-`/api/` paths
/// - `/api/health`
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Let non-API routes 404 normally
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if path == "/api/health" {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized());
        }
    };

    match jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::try_from(claims)
                .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?;
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// Role gating middleware
///
/// # Usage
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/delivery/available", get(handler::list_available))
///     .layer(middleware::from_fn(require_role(Role::Rider)));
/// ```
///
/// Admins pass every gate. A wrong role yields 403 Forbidden.
pub fn require_role(
    role: Role,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::unauthorized())?;

            if user.role != role && !user.is_admin() {
                security_log!(
                    "WARN",
                    "role_denied",
                    user_id = user.id.clone(),
                    username = user.username.clone(),
                    required_role = role.as_str()
                );
                return Err(AppError::with_message(
                    ErrorCode::RoleRequired,
                    format!("Role required: {}", role),
                ));
            }

            Ok(next.run(req).await)
        })
    }
}

/// Admin middleware - requires the admin role
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::unauthorized())?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.clone(),
            username = user.username.clone(),
            user_role = user.role.as_str()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

//! Authentication and authorization
//!
//! - [`JwtService`] - JWT token service
//! - [`CurrentUser`] - per-request user context
//! - [`require_auth`] - authentication middleware
//! - [`require_role`] - role gating middleware

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth, require_role};

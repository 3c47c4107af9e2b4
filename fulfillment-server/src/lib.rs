//! Brewhaul Fulfillment Server
//!
//! Backend for the coffee-shop fulfillment flow:
//!
//! - **Orders** (`orders`): order state machine and pricing
//! - **Delivery** (`delivery`): rider assignment, proofs, admin validation
//! - **Database** (`db`): embedded SurrealDB storage and repositories
//! - **Auth** (`auth`): JWT authentication and role gating
//! - **Collaborators** (`services`): payment gateway and image store clients
//! - **HTTP API** (`api`): RESTful interface
//!
//! # Module structure
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # Config, state, server
//! ├── auth/          # JWT, extractor, middleware
//! ├── db/            # Database layer + repositories
//! ├── orders/        # Order state machine + pricing
//! ├── delivery/      # Assignment engine + validation gate
//! ├── services/      # External collaborator clients
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Logging and helpers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod delivery;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use delivery::DeliveryEngine;
pub use orders::OrdersManager;

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - tracing format specifiers supported
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

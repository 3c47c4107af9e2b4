//! Payment API module

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::require_role;
use crate::core::ServerState;
use shared::models::Role;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", payment_routes())
}

fn payment_routes() -> Router<ServerState> {
    Router::new()
        .route("/source", post(handler::create_source))
        .route_layer(middleware::from_fn(require_role(Role::Customer)))
}

//! Order API module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_role;
use crate::core::ServerState;
use shared::models::Role;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    // Customer-only lifecycle operations
    let customer = Router::new()
        .route("/", post(handler::create))
        .route("/paid", post(handler::create_paid))
        .route("/user", get(handler::list_mine))
        .route("/{id}/checkout", put(handler::checkout))
        .route("/{id}/cancel", put(handler::cancel))
        .route("/{id}/confirm-receipt", put(handler::confirm_receipt))
        .route_layer(middleware::from_fn(require_role(Role::Customer)));

    // Visible to owner, assigned rider, or admin; checked in the handler
    let common = Router::new().route("/{id}", get(handler::get_by_id));

    customer.merge(common)
}

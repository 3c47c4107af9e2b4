//! Delivery API module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{require_admin, require_role};
use crate::core::ServerState;
use shared::models::Role;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/delivery", delivery_routes())
}

fn delivery_routes() -> Router<ServerState> {
    let rider = Router::new()
        .route("/available", get(handler::list_available))
        .route("/my", get(handler::my_tasks))
        .route("/stats", get(handler::rider_stats))
        .route("/{id}/accept", post(handler::accept))
        .route("/{id}/pickup-complete", put(handler::pickup_complete))
        .route("/{id}/delivery-complete", put(handler::delivery_complete))
        .route_layer(middleware::from_fn(require_role(Role::Rider)));

    let admin = Router::new()
        .route("/tasks", get(handler::list_tasks))
        .route("/{id}/validate-pickup", put(handler::validate_pickup))
        .route("/{id}/validate-delivery", put(handler::validate_delivery))
        .route_layer(middleware::from_fn(require_admin));

    rider.merge(admin)
}

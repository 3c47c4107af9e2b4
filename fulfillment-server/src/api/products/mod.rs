//! Product API module (read-only)

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
}

//! Server Implementation
//!
//! HTTP server startup and router assembly.

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::{Config, ServerState};
use shared::AppError;

/// HTTP request log middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();
    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::orders::router())
        .merge(crate::api::delivery::router())
        .merge(crate::api::products::router())
        .merge(crate::api::payments::router())
}

/// Build the fully configured application with middleware and state
pub fn build_app(state: ServerState) -> Router {
    build_router()
        // JWT auth at the router level; require_auth skips public routes
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let app = build_app(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Fulfillment server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        Ok(())
    }
}

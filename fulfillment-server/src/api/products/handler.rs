//! Product API Handlers

use axum::extract::{Path, State};

use crate::core::ServerState;
use crate::db::repository::ProductRepository;
use shared::models::Product;
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

/// GET /api/products - all active products
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let products = repo
        .find_all()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(ApiResponse::success(products))
}

/// GET /api/products/{id} - one product
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Product>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
        })?;
    Ok(ApiResponse::success(product))
}

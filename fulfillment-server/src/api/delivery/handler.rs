//! Delivery API Handlers

use axum::{
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::delivery::{DeliveryTask, ProofImage};
use shared::models::{Order, OrderStatus, RiderStats};
use shared::{ApiResponse, AppError, AppResult, ErrorCode};

#[derive(Deserialize)]
pub struct TaskQuery {
    pub status: Option<OrderStatus>,
    pub assigned: Option<bool>,
}

/// Pull the proof photo out of a multipart body. Accepts the first
/// field carrying a file; the field is conventionally named `image`.
async fn extract_proof(mut multipart: Multipart) -> AppResult<ProofImage> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid(format!("Malformed multipart body: {e}")))?
    {
        let is_file = field.file_name().is_some() || field.name() == Some("image");
        if !is_file {
            continue;
        }

        let mime = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                field
                    .file_name()
                    .and_then(|name| mime_guess::from_path(name).first())
                    .map(|m| m.essence_str().to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid(format!("Failed to read upload: {e}")))?;

        return Ok(ProofImage {
            bytes: bytes.to_vec(),
            mime,
        });
    }

    Err(AppError::new(ErrorCode::NoFileProvided))
}

/// GET /api/delivery/available - unassigned paid orders
pub async fn list_available(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<DeliveryTask>>> {
    let tasks = state.delivery.list_available().await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/delivery/{id}/accept - claim an order (409 on conflict)
pub async fn accept(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DeliveryTask>> {
    let task = state.delivery.accept(&id, &user.id).await?;
    Ok(ApiResponse::success(task))
}

/// GET /api/delivery/my - the rider's tasks
pub async fn my_tasks(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<DeliveryTask>>> {
    let tasks = state.delivery.my_tasks(&user.id).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /api/delivery/stats - the rider's lifetime counters
pub async fn rider_stats(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<RiderStats>> {
    let stats = state.delivery.rider_stats(&user.id).await?;
    Ok(ApiResponse::success(stats))
}

/// PUT /api/delivery/{id}/pickup-complete - upload pickup proof
pub async fn pickup_complete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<Order>> {
    let image = extract_proof(multipart).await?;
    let order = state.delivery.record_pickup_proof(&id, &user.id, image).await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/delivery/{id}/delivery-complete - upload delivery proof
pub async fn delivery_complete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<Order>> {
    let image = extract_proof(multipart).await?;
    let order = state
        .delivery
        .record_delivery_proof(&id, &user.id, image)
        .await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/delivery/{id}/validate-pickup - admin validates the pickup leg
pub async fn validate_pickup(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.delivery.validate_pickup(&id, &user.id).await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/delivery/{id}/validate-delivery - admin validates the delivery leg
pub async fn validate_delivery(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.delivery.validate_delivery(&id, &user.id).await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/delivery/tasks - admin task listing with filters
pub async fn list_tasks(
    State(state): State<ServerState>,
    Query(query): Query<TaskQuery>,
) -> AppResult<ApiResponse<Vec<DeliveryTask>>> {
    let tasks = state.delivery.list_tasks(query.status, query.assigned).await?;
    Ok(ApiResponse::success(tasks))
}

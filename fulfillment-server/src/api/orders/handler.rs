//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::{OrderDraft, OrderPage};
use shared::models::{Order, OrderStatus};
use shared::{ApiResponse, AppResult};

#[derive(Deserialize)]
pub struct CreatePaidRequest {
    #[serde(flatten)]
    pub draft: OrderDraft,
    pub payment_reference: String,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

/// POST /api/orders - create an order in `to_pay`
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(draft): Json<OrderDraft>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.create(&user.id, draft).await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/paid - create an order for gateway-confirmed funds
pub async fn create_paid(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<CreatePaidRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders
        .create_paid(&user.id, req.draft, &req.payment_reference)
        .await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/orders/user - the customer's orders, newest first
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<OrderPage>> {
    let page = state
        .orders
        .list_for_customer(&user.id, query.status, query.page, query.per_page)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/orders/{id} - owner, assigned rider, or admin
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.get(&id, &user).await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/{id}/checkout - commit payment intent, debit stock
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.checkout(&id, &user.id).await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/{id}/cancel - cancel within the window
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.cancel(&id, &user.id, &req.reason).await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/{id}/confirm-receipt - customer completes the order
pub async fn confirm_receipt(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.confirm_receipt(&id, &user.id).await?;
    Ok(ApiResponse::success(order))
}

//! Payment API Handlers

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::services::PaymentSource;
use shared::{ApiResponse, AppError, AppResult};

#[derive(Deserialize)]
pub struct CreateSourceRequest {
    /// Amount in minor units (centavos)
    pub amount_minor: i64,
    /// Gateway source type, e.g. "gcash" or "grab_pay"
    pub kind: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub success_url: String,
    pub failed_url: String,
}

fn default_currency() -> String {
    "PHP".to_string()
}

/// POST /api/payments/source - create a redirect payment source
pub async fn create_source(
    State(state): State<ServerState>,
    Json(req): Json<CreateSourceRequest>,
) -> AppResult<ApiResponse<PaymentSource>> {
    if req.amount_minor <= 0 {
        return Err(AppError::validation("Amount must be positive"));
    }

    let source = state
        .gateway
        .create_source(
            req.amount_minor,
            &req.currency,
            &req.kind,
            &req.success_url,
            &req.failed_url,
        )
        .await?;
    Ok(ApiResponse::success(source))
}

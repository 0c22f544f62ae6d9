use crate::{
    auth::SessionContext,
    entities::product,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "delta": -2,
    "reason": "used in repair RPR-2025-004211"
}))]
pub struct AdjustStockRequest {
    /// Signed quantity change; stock never goes below zero
    #[schema(example = -2)]
    pub delta: i32,
    /// Why the stock moved
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
}

/// Create the inventory router. Stock levels live on products; these
/// routes are the adjustment and reporting surface.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(low_stock))
        .route("/:product_id/adjust", post(adjust_stock))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses(
        (status = 200, description = "Active products at or below their reorder level", body = ApiResponse<Vec<product::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    _session: SessionContext,
) -> ApiResult<Vec<product::Model>> {
    let products = state.product_service().low_stock_products().await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/{product_id}/adjust",
    request_body = AdjustStockRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<product::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Adjustment would take stock below zero", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> ApiResult<product::Model> {
    payload
        .validate()
        .map_err(|e| crate::errors::ServiceError::ValidationError(e.to_string()))?;

    let updated = state
        .product_service()
        .adjust_stock(product_id, payload.delta, payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

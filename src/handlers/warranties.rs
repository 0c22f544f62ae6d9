use super::common::{total_pages, PaginationParams};
use crate::{
    auth::SessionContext,
    entities::warranty_registration,
    errors::ServiceError,
    resolution::WarrantyInfo,
    services::warranties::{RegisterWarrantyCommand, SerialSearchHit},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SerialSearchQuery {
    /// Serial number fragment (at least 2 characters)
    pub serial: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "serial_number": "SN-WBH-2025-001234",
    "product_name": "ProBook 450 G10",
    "category": "Laptop",
    "customer_name": "Kamal Silva",
    "customer_phone": "0712345678",
    "customer_email": "kamal@example.com",
    "purchase_date": "2025-05-01",
    "warranty_months": 12
}))]
pub struct RegisterWarrantyRequest {
    #[validate(length(min = 1))]
    pub serial_number: String,
    #[validate(length(min = 1))]
    pub product_name: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub customer_name: String,
    #[validate(length(min = 1))]
    pub customer_phone: String,
    #[validate(length(min = 1))]
    pub customer_email: String,
    pub purchase_date: NaiveDate,
    /// Warranty length in months (30-day months)
    #[schema(example = 12)]
    pub warranty_months: i32,
}

/// Create the warranties router
pub fn warranty_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_registrations).post(register_warranty))
        .route("/search", get(search_by_serial))
        .route("/serial/:serial", get(resolve_serial))
}

#[utoipa::path(
    get,
    path = "/api/v1/warranties",
    params(PaginationParams),
    responses(
        (status = 200, description = "Warranty registrations listed", body = ApiResponse<PaginatedResponse<warranty_registration::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "warranties"
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<warranty_registration::Model>> {
    let page = params.page();
    let limit = params.limit();

    let (items, total) = state
        .warranty_service()
        .list_registrations(page, limit)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/warranties",
    request_body = RegisterWarrantyRequest,
    responses(
        (status = 200, description = "Warranty registered", body = ApiResponse<warranty_registration::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Serial already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "warranties"
)]
pub async fn register_warranty(
    State(state): State<AppState>,
    _session: SessionContext,
    Json(payload): Json<RegisterWarrantyRequest>,
) -> ApiResult<warranty_registration::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let command = RegisterWarrantyCommand {
        serial_number: payload.serial_number,
        product_name: payload.product_name,
        category: payload.category,
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        customer_email: payload.customer_email,
        purchase_date: payload.purchase_date,
        warranty_months: payload.warranty_months,
    };

    let created = state.warranty_service().register(command).await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/warranties/search",
    params(SerialSearchQuery),
    responses(
        (status = 200, description = "Matching serials with derived warranty state; empty below the fragment guard", body = ApiResponse<Vec<SerialSearchHit>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "warranties"
)]
pub async fn search_by_serial(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(query): Query<SerialSearchQuery>,
) -> ApiResult<Vec<SerialSearchHit>> {
    let hits = state
        .warranty_service()
        .search_by_serial_fragment(&query.serial)
        .await?;
    Ok(Json(ApiResponse::success(hits)))
}

#[utoipa::path(
    get,
    path = "/api/v1/warranties/serial/{serial}",
    params(
        ("serial" = String, Path, description = "Exact serial number")
    ),
    responses(
        (status = 200, description = "Derived warranty state", body = ApiResponse<WarrantyInfo>),
        (status = 404, description = "Serial not registered", body = crate::errors::ErrorResponse)
    ),
    tag = "warranties"
)]
pub async fn resolve_serial(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(serial): Path<String>,
) -> ApiResult<WarrantyInfo> {
    let info = state.warranty_service().resolve_by_serial(&serial).await?;
    Ok(Json(ApiResponse::success(info)))
}

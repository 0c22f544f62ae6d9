use crate::{
    auth::SessionContext,
    entities::repair_order,
    errors::ServiceError,
    lifecycle::RepairStatus,
    resolution::RepairDraft,
    services::repairs::{RepairListFilter, UpdateRepairInput},
    validation::RepairSubmission,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RepairListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by lifecycle status label
    pub status: Option<String>,
    /// Filter by assigned technician
    pub technician_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RepairSearchQuery {
    /// Ticket number or customer phone fragment
    pub q: String,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PrefillQuery {
    /// Exact serial number to resolve
    pub serial: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "aa0e8400-e29b-41d4-a716-446655440000",
    "ticket_number": "RPR-2025-004211",
    "customer_id": "123e4567-e89b-12d3-a456-426614174000",
    "customer_name": "Nimal Perera",
    "customer_phone": "0712345678",
    "customer_email": "nimal@example.com",
    "device_type": "Laptop",
    "device_model": "ThinkPad T14",
    "serial_number": "SN-4411",
    "under_warranty": true,
    "reported_issue": "No display on boot",
    "technician_id": "bb0e8400-e29b-41d4-a716-446655440000",
    "status": "Pending",
    "estimated_cost": "12500.00",
    "advance_payment": "2000.00",
    "extra_expenses": "0.00",
    "due_amount": "10500.00",
    "date_received": "2025-06-01",
    "deadline": "2025-06-10",
    "notes": null,
    "created_at": "2025-06-01T10:30:00Z",
    "updated_at": null
}))]
pub struct RepairSummary {
    pub id: Uuid,
    /// Human-readable ticket number
    #[schema(example = "RPR-2025-004211")]
    pub ticket_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub device_type: String,
    pub device_model: String,
    pub serial_number: Option<String>,
    /// Derived from warranty resolution; read-only
    pub under_warranty: bool,
    pub reported_issue: String,
    pub technician_id: Uuid,
    /// Lifecycle status label
    #[schema(example = "Pending")]
    pub status: String,
    pub estimated_cost: Decimal,
    pub advance_payment: Decimal,
    pub extra_expenses: Decimal,
    /// Derived: estimated + extras - advance; never stored
    pub due_amount: Decimal,
    pub date_received: NaiveDate,
    pub deadline: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<repair_order::Model> for RepairSummary {
    fn from(model: repair_order::Model) -> Self {
        let due_amount = model.due_amount();
        Self {
            id: model.id,
            ticket_number: model.ticket_number,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            customer_email: model.customer_email,
            device_type: model.device_type,
            device_model: model.device_model,
            serial_number: model.serial_number,
            under_warranty: model.under_warranty,
            reported_issue: model.reported_issue,
            technician_id: model.technician_id,
            status: model.status,
            estimated_cost: model.estimated_cost,
            advance_payment: model.advance_payment,
            extra_expenses: model.extra_expenses,
            due_amount,
            date_received: model.date_received,
            deadline: model.deadline,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateRepairRequest {
    pub device_type: Option<String>,
    pub device_model: Option<String>,
    pub reported_issue: Option<String>,
    pub technician_id: Option<Uuid>,
    pub deadline: Option<NaiveDate>,
    /// Monetary form text, thousands separators tolerated
    #[schema(example = "12,500.00")]
    pub estimated_cost: Option<String>,
    pub advance_payment: Option<String>,
    pub extra_expenses: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({ "status": "Completed" }))]
pub struct ChangeStatusRequest {
    /// Target lifecycle status label
    #[schema(example = "Completed")]
    pub status: String,
}

/// Create the repairs router
pub fn repair_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_repairs).post(create_repair))
        .route("/search", get(search_repairs))
        .route("/prefill", get(prefill_repair))
        .route(
            "/:id",
            get(get_repair).put(update_repair).delete(delete_repair),
        )
        .route("/:id/status", put(change_status))
        .route("/:id/next-statuses", get(next_statuses))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs",
    params(RepairListQuery),
    responses(
        (status = 200, description = "Repairs listed", body = ApiResponse<PaginatedResponse<RepairSummary>>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn list_repairs(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(query): Query<RepairListQuery>,
) -> ApiResult<PaginatedResponse<RepairSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = RepairListFilter {
        status: query.status,
        technician_id: query.technician_id,
    };
    let (records, total) = state
        .repair_service()
        .list_repairs(page, limit, filter)
        .await?;

    let items: Vec<RepairSummary> = records.into_iter().map(RepairSummary::from).collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/search",
    params(RepairSearchQuery),
    responses(
        (status = 200, description = "Matching repairs", body = ApiResponse<Vec<RepairSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn search_repairs(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(query): Query<RepairSearchQuery>,
) -> ApiResult<Vec<RepairSummary>> {
    let records = state.repair_service().search_repairs(&query.q).await?;
    let items = records.into_iter().map(RepairSummary::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/prefill",
    params(PrefillQuery),
    responses(
        (status = 200, description = "Draft prefilled from warranty lookup", body = ApiResponse<RepairDraft>),
        (status = 404, description = "Serial not registered", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn prefill_repair(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(query): Query<PrefillQuery>,
) -> ApiResult<RepairDraft> {
    let draft = state
        .repair_service()
        .prefill_from_serial(&query.serial)
        .await?;
    Ok(Json(ApiResponse::success(draft)))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/{id}",
    params(
        ("id" = Uuid, Path, description = "Repair order ID")
    ),
    responses(
        (status = 200, description = "Repair fetched", body = ApiResponse<RepairSummary>),
        (status = 404, description = "Repair not found", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn get_repair(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
) -> ApiResult<RepairSummary> {
    match state.repair_service().get_repair(&id).await? {
        Some(repair) => Ok(Json(ApiResponse::success(RepairSummary::from(repair)))),
        None => Err(ServiceError::NotFound(format!(
            "Repair order {} not found",
            id
        ))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/repairs",
    request_body = RepairSubmission,
    responses(
        (status = 200, description = "Repair created", body = ApiResponse<RepairSummary>),
        (status = 422, description = "Submission failed validation", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn create_repair(
    State(state): State<AppState>,
    _session: SessionContext,
    Json(payload): Json<RepairSubmission>,
) -> ApiResult<RepairSummary> {
    let created = state.repair_service().create_repair(payload).await?;
    Ok(Json(ApiResponse::success(RepairSummary::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/repairs/{id}",
    request_body = UpdateRepairRequest,
    params(
        ("id" = Uuid, Path, description = "Repair order ID")
    ),
    responses(
        (status = 200, description = "Repair updated", body = ApiResponse<RepairSummary>),
        (status = 404, description = "Repair not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Update failed validation", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn update_repair(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRepairRequest>,
) -> ApiResult<RepairSummary> {
    let input = UpdateRepairInput {
        device_type: payload.device_type,
        device_model: payload.device_model,
        reported_issue: payload.reported_issue,
        technician_id: payload.technician_id,
        deadline: payload.deadline,
        estimated_cost: payload.estimated_cost,
        advance_payment: payload.advance_payment,
        extra_expenses: payload.extra_expenses,
        notes: payload.notes,
    };

    let updated = state.repair_service().update_repair(id, input).await?;
    Ok(Json(ApiResponse::success(RepairSummary::from(updated))))
}

#[utoipa::path(
    put,
    path = "/api/v1/repairs/{id}/status",
    request_body = ChangeStatusRequest,
    params(
        ("id" = Uuid, Path, description = "Repair order ID")
    ),
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<RepairSummary>),
        (status = 400, description = "Transition rejected", body = crate::errors::ErrorResponse),
        (status = 404, description = "Repair not found", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn change_status(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusRequest>,
) -> ApiResult<RepairSummary> {
    let updated = state
        .repair_service()
        .change_status(id, &payload.status)
        .await?;
    Ok(Json(ApiResponse::success(RepairSummary::from(updated))))
}

#[utoipa::path(
    get,
    path = "/api/v1/repairs/{id}/next-statuses",
    params(
        ("id" = Uuid, Path, description = "Repair order ID")
    ),
    responses(
        (status = 200, description = "Statuses still reachable, in lifecycle order", body = ApiResponse<Vec<RepairStatus>>),
        (status = 404, description = "Repair not found", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn next_statuses(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<RepairStatus>> {
    let statuses = state.repair_service().next_statuses(id).await?;
    Ok(Json(ApiResponse::success(statuses)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/repairs/{id}",
    params(
        ("id" = Uuid, Path, description = "Repair order ID")
    ),
    responses(
        (status = 200, description = "Repair deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Repair not found", body = crate::errors::ErrorResponse)
    ),
    tag = "repairs"
)]
pub async fn delete_repair(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.repair_service().delete_repair(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "repair_id": id,
        "deleted": true
    }))))
}

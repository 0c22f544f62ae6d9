use super::common::{total_pages, PaginationParams};
use crate::{
    auth::SessionContext,
    entities::customer,
    errors::ServiceError,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerSearchQuery {
    /// Phone number fragment (at least 3 characters)
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Nimal Perera",
    "phone": "0712345678",
    "email": "nimal@example.com"
}))]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub email: String,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Create the customers router
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/search", get(search_customers))
        .route("/by-phone/:phone", get(get_customer_by_phone))
        .route(
            "/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Customers listed", body = ApiResponse<PaginatedResponse<customer::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let page = params.page();
    let limit = params.limit();

    let (items, total) = state
        .customer_service()
        .list_customers(page, limit)
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
    get,
    path = "/api/v1/customers/search",
    params(CustomerSearchQuery),
    responses(
        (status = 200, description = "Matching customers; empty below the fragment guard", body = ApiResponse<Vec<customer::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn search_customers(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(query): Query<CustomerSearchQuery>,
) -> ApiResult<Vec<customer::Model>> {
    let matches = state
        .customer_service()
        .search_by_phone_fragment(&query.phone)
        .await?;
    Ok(Json(ApiResponse::success(matches)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/by-phone/{phone}",
    params(
        ("phone" = String, Path, description = "Exact phone number")
    ),
    responses(
        (status = 200, description = "Customer fetched", body = ApiResponse<customer::Model>),
        (status = 404, description = "No customer with this phone", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer_by_phone(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(phone): Path<String>,
) -> ApiResult<customer::Model> {
    match state.customer_service().find_by_phone(&phone).await? {
        Some(found) => Ok(Json(ApiResponse::success(found))),
        None => Err(ServiceError::NotFound(format!(
            "no customer with phone {}",
            phone
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer fetched", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
) -> ApiResult<customer::Model> {
    match state.customer_service().get_customer(&id).await? {
        Some(found) => Ok(Json(ApiResponse::success(found))),
        None => Err(ServiceError::NotFound(format!("Customer {} not found", id))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Phone already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    _session: SessionContext,
    Json(payload): Json<CreateCustomerRequest>,
) -> ApiResult<customer::Model> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .customer_service()
        .create_customer(&payload.name, &payload.phone, &payload.email)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    request_body = UpdateCustomerRequest,
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> ApiResult<customer::Model> {
    let updated = state
        .customer_service()
        .update_customer(id, payload.name, payload.phone, payload.email)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    params(
        ("id" = Uuid, Path, description = "Customer ID")
    ),
    responses(
        (status = 200, description = "Customer deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.customer_service().delete_customer(id).await?;
    Ok(Json(ApiResponse::success(json!({
        "customer_id": id,
        "deleted": true
    }))))
}

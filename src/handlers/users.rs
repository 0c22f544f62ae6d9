use super::common::{total_pages, PaginationParams};
use crate::{
    auth::SessionContext,
    entities::user::{self, UserRole},
    errors::ServiceError,
    services::users::CreateUserInput,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Staff account without credential material.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            username: model.username,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "first_name": "Saman",
    "last_name": "Fernando",
    "username": "saman",
    "password": "a strong passphrase",
    "role": "Technician"
}))]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// Create the users router. Gated to Admin in the route table.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user))
        .route("/:id/deactivate", post(deactivate_user))
}

/// Technician directory for repair assignment; available to all staff.
pub fn technician_routes() -> Router<AppState> {
    Router::new().route("/", get(list_technicians))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Staff accounts listed", body = ApiResponse<PaginatedResponse<UserSummary>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<UserSummary>> {
    let page = params.page();
    let limit = params.limit();

    let (records, total) = state.user_service().list_users(page, limit).await?;
    let items: Vec<UserSummary> = records.into_iter().map(UserSummary::from).collect();

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
    path = "/api/v1/technicians",
    responses(
        (status = 200, description = "Active technicians eligible for assignment", body = ApiResponse<Vec<UserSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_technicians(
    State(state): State<AppState>,
    _session: SessionContext,
) -> ApiResult<Vec<UserSummary>> {
    let technicians = state.user_service().list_technicians().await?;
    let items = technicians.into_iter().map(UserSummary::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User fetched", body = ApiResponse<UserSummary>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
) -> ApiResult<UserSummary> {
    match state.user_service().get_user(&id).await? {
        Some(found) => Ok(Json(ApiResponse::success(UserSummary::from(found)))),
        None => Err(ServiceError::NotFound(format!("User {} not found", id))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Staff account created", body = ApiResponse<UserSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    _session: SessionContext,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<UserSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .user_service()
        .create_user(CreateUserInput {
            first_name: payload.first_name,
            last_name: payload.last_name,
            username: payload.username,
            password: payload.password,
            role: payload.role,
        })
        .await?;
    Ok(Json(ApiResponse::success(UserSummary::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    request_body = UpdateUserRequest,
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserSummary>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<UserSummary> {
    let updated = state
        .user_service()
        .update_user(
            id,
            payload.first_name,
            payload.last_name,
            payload.role,
            payload.is_active,
        )
        .await?;
    Ok(Json(ApiResponse::success(UserSummary::from(updated))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/deactivate",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deactivated", body = ApiResponse<UserSummary>),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<Uuid>,
) -> ApiResult<UserSummary> {
    let deactivated = state.user_service().deactivate_user(id).await?;
    Ok(Json(ApiResponse::success(UserSummary::from(deactivated))))
}

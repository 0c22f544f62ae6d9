use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fixpoint API",
        version = "1.0.0",
        description = r#"
# Fixpoint Repair Shop API

Back office API for a computer repair and retail shop: repair tickets
with a forward-only lifecycle, warranty lookup by serial number,
customer identity resolution, product inventory, and staff management.

## Authentication

All API endpoints require a JWT obtained from `/auth/login`. Include
it in the Authorization header:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

Errors use a consistent response body with appropriate status codes:

```json
{
  "error": "Bad Request",
  "message": "cannot move a repair backward or repeat its status (from 'Completed' to 'Pending')",
  "timestamp": "2025-06-15T10:30:00Z"
}
```

Submission validation failures add a `field_errors` map keyed by the
offending field.

## Pagination

List endpoints support `page` (default 1) and `limit` (default 20,
max 100) query parameters.
        "#,
        contact(
            name = "Fixpoint Support",
            email = "support@fixpoint.dev"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "repairs", description = "Repair ticket management and lifecycle"),
        (name = "customers", description = "Customer identity management"),
        (name = "warranties", description = "Warranty registration and serial lookup"),
        (name = "products", description = "Product catalog"),
        (name = "inventory", description = "Stock adjustments and reporting"),
        (name = "users", description = "Staff accounts and technician directory")
    ),
    paths(
        // Repairs
        crate::handlers::repairs::list_repairs,
        crate::handlers::repairs::search_repairs,
        crate::handlers::repairs::prefill_repair,
        crate::handlers::repairs::get_repair,
        crate::handlers::repairs::create_repair,
        crate::handlers::repairs::update_repair,
        crate::handlers::repairs::change_status,
        crate::handlers::repairs::next_statuses,
        crate::handlers::repairs::delete_repair,

        // Customers
        crate::handlers::customers::list_customers,
        crate::handlers::customers::search_customers,
        crate::handlers::customers::get_customer_by_phone,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        // Warranties
        crate::handlers::warranties::list_registrations,
        crate::handlers::warranties::register_warranty,
        crate::handlers::warranties::search_by_serial,
        crate::handlers::warranties::resolve_serial,

        // Products + inventory
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::adjust_stock,

        // Users
        crate::handlers::users::list_users,
        crate::handlers::users::list_technicians,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::deactivate_user,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,

            // Repair types
            crate::handlers::repairs::RepairSummary,
            crate::handlers::repairs::UpdateRepairRequest,
            crate::handlers::repairs::ChangeStatusRequest,
            crate::validation::RepairSubmission,
            crate::lifecycle::RepairStatus,
            crate::resolution::RepairDraft,
            crate::resolution::WarrantyInfo,

            // Customer types
            crate::entities::customer::Model,
            crate::handlers::customers::CreateCustomerRequest,
            crate::handlers::customers::UpdateCustomerRequest,

            // Warranty types
            crate::entities::warranty_registration::Model,
            crate::handlers::warranties::RegisterWarrantyRequest,
            crate::services::warranties::SerialSearchHit,

            // Product + inventory types
            crate::entities::product::Model,
            crate::handlers::products::ProductRequest,
            crate::handlers::inventory::AdjustStockRequest,

            // User types
            crate::handlers::users::UserSummary,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,
            crate::entities::user::UserRole,

            // Auth types
            crate::auth::SessionContext,
            crate::auth::LoginRequest,
            crate::auth::TokenResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_core_surfaces() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Fixpoint API"));
        assert!(json.contains("/api/v1/repairs"));
        assert!(json.contains("/api/v1/warranties/serial/{serial}"));
    }
}

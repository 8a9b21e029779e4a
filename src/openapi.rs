use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Promo Orders API",
        version = "0.1.0",
        description = r#"
# Promotional Ordering API

Customers place orders through participating shops during promotional
events; administrators review and approve orders through an authenticated
dashboard session.

## Authentication

Admin endpoints require a JWT issued by `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

## Rate Limiting

Order submission is rate limited per caller IP with a sliding window.
Check the response headers:
- `X-RateLimit-Limit`: Maximum requests per window
- `X-RateLimit-Remaining`: Remaining requests in current window
- `X-RateLimit-Reset`: Seconds until the window resets

## Error Handling

Failures share one response shape:

```json
{
  "status": "error",
  "message": "Order not found"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Order submission, approval and summary"),
        (name = "Catalog", description = "Products, shops, events and address reference data"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::approve_order,
        crate::handlers::orders::get_order_summary,

        // Catalog
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product,
        crate::handlers::catalog::list_shops,
        crate::handlers::catalog::get_shop,
        crate::handlers::catalog::list_events,
        crate::handlers::catalog::list_provinces,
        crate::handlers::catalog::get_province,
        crate::handlers::catalog::list_districts,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            // Order types
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::CustomerPayload,
            crate::services::orders::OrderLineRequest,
            crate::services::orders::ApproveOrderRequest,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderSummaryResponse,
            crate::services::orders::OrderSummaryLine,
            crate::services::orders::Gender,

            // Catalog types
            crate::services::catalog::ShopSummary,
            crate::services::catalog::ProvinceWithDistricts,
            crate::entities::product::Model,
            crate::entities::shop::Model,
            crate::entities::promo_event::Model,
            crate::entities::province::Model,
            crate::entities::district::Model,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::orders::{
    ApproveOrderRequest, CreateOrderRequest, OrderResponse, OrderSummaryResponse,
};
use crate::{ApiResponse, AppState};

/// Submit a new order.
///
/// The raw body is kept around so a failed submission can be recorded in the
/// error-log store with exactly what the caller sent.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Atomically upsert the customer by phone number, compute totals and persist the order with its line items",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced record missing on update", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate key conflict", body = crate::errors::ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let request: CreateOrderRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            let err = ServiceError::ValidationError(e.to_string());
            state
                .services
                .error_log
                .record(uri.path(), &body, &err.to_string())
                .await;
            return Err(err);
        }
    };

    match state.services.orders.create_order(request).await {
        Ok(order) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::with_message("Order created successfully", order)),
        )),
        Err(err) => {
            state
                .services
                .error_log
                .record(uri.path(), &body, &err.to_string())
                .await;
            Err(err)
        }
    }
}

/// Approve (or otherwise re-status) an order.
///
/// Requires an authenticated admin session; the admin's name is stored as
/// the order remark. Any status may be set from any other.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/approve",
    summary = "Approve order",
    request_body = ApproveOrderRequest,
    params(
        ("id" = String, Path, description = "Order identifier"),
    ),
    responses(
        (status = 201, description = "Order status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Invalid order ID or payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn approve_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    auth_user: AuthUser,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    let order_id = Uuid::parse_str(&id)
        .map_err(|_| ServiceError::BadRequest("Invalid order ID".to_string()))?;

    let request: ApproveOrderRequest = serde_json::from_str(&body)
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let approver = auth_user.display_name().map(str::to_string);

    match state
        .services
        .orders
        .approve_order(order_id, request, approver)
        .await
    {
        Ok(order) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::with_message(
                "Order approved successfully",
                order,
            )),
        )),
        Err(err) => {
            state
                .services
                .error_log
                .record(uri.path(), &body, &err.to_string())
                .await;
            Err(err)
        }
    }
}

/// Public order summary, addressed by order code.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_code}/summary",
    summary = "Order summary",
    params(
        ("order_code" = String, Path, description = "Human-readable order code"),
    ),
    responses(
        (status = 200, description = "Order summary", body = ApiResponse<OrderSummaryResponse>),
        (status = 400, description = "Invalid ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order_summary(
    State(state): State<AppState>,
    Path(order_code): Path<String>,
) -> Result<Json<ApiResponse<OrderSummaryResponse>>, ServiceError> {
    if order_code.is_empty() || order_code == "undefined" {
        return Err(ServiceError::BadRequest("Invalid ID".to_string()));
    }

    let summary = state.services.orders.get_order_summary(&order_code).await?;
    Ok(Json(ApiResponse::success(summary)))
}

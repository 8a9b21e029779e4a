//! Promo Orders API Library
//!
//! Core functionality for the promotional ordering backend: customers place
//! orders through participating shops, administrators review and approve
//! them through an authenticated dashboard.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod rate_limiter;
pub mod services;

use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub redis: Arc<redis::Client>,
}

/// Response wrapper shared by every endpoint: `{status, message?, data?}`.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// "success" or "error"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    // Public order endpoints; the order-creation POST sits behind its own
    // rate-limit path policy applied in main.
    let orders_public = Router::new()
        .route("/orders", post(handlers::orders::create_order))
        .route(
            "/orders/:id/summary",
            get(handlers::orders::get_order_summary),
        );

    // Approval requires an authenticated admin session
    let orders_admin = Router::new()
        .route(
            "/orders/:id/approve",
            post(handlers::orders::approve_order),
        )
        .route_layer(axum::middleware::from_fn(auth::auth_middleware));

    // Catalog / reference lookups
    let catalog = Router::new()
        .route("/products", get(handlers::catalog::list_products))
        .route("/products/:id", get(handlers::catalog::get_product))
        .route("/shops", get(handlers::catalog::list_shops))
        .route("/shops/:id", get(handlers::catalog::get_shop))
        .route("/events", get(handlers::catalog::list_events))
        .route("/provinces", get(handlers::catalog::list_provinces))
        .route("/provinces/:id", get(handlers::catalog::get_province))
        .route(
            "/districts/:province_id",
            get(handlers::catalog::list_districts),
        );

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(orders_public)
        .merge(orders_admin)
        .merge(catalog)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "promo-orders-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    // Check database connectivity
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    // Check Redis connectivity (only meaningful when the Redis rate limiter
    // backend is enabled, but cheap to report either way)
    let redis_status = match state.redis.get_async_connection().await {
        Ok(mut conn) => match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(_) => "healthy",
            Err(_) => "unhealthy",
        },
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": if db_status == "healthy" { "healthy" } else { "unhealthy" },
        "checks": {
            "database": db_status,
            "redis": redis_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_omits_message() {
        let response = ApiResponse::success(42);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"], 42);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn with_message_includes_both_fields() {
        let response = ApiResponse::with_message("Order created successfully", json!({"id": 1}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "Order created successfully");
        assert_eq!(value["data"]["id"], 1);
    }
}

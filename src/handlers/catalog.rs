use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::entities::{district, product, promo_event, province, shop};
use crate::errors::ServiceError;
use crate::services::catalog::{ProvinceWithDistricts, ShopSummary};
use crate::{ApiResponse, AppState};

fn parse_id(raw: &str) -> Result<i32, ServiceError> {
    raw.parse::<i32>()
        .map_err(|_| ServiceError::BadRequest("Invalid ID".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    responses(
        (status = 200, description = "All catalog products", body = ApiResponse<Vec<product::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<product::Model>>>, ServiceError> {
    let products = state.services.catalog.list_products().await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product",
    params(("id" = i32, Path, description = "Product identifier")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<product::Model>>, ServiceError> {
    let product = state.services.catalog.get_product(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    get,
    path = "/api/v1/shops",
    summary = "List active shops",
    responses(
        (status = 200, description = "Active shops", body = ApiResponse<Vec<ShopSummary>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_shops(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ShopSummary>>>, ServiceError> {
    let shops = state.services.catalog.list_active_shops().await?;
    Ok(Json(ApiResponse::success(shops)))
}

#[utoipa::path(
    get,
    path = "/api/v1/shops/{id}",
    summary = "Get shop",
    params(("id" = i32, Path, description = "Shop identifier")),
    responses(
        (status = 200, description = "Shop", body = ApiResponse<shop::Model>),
        (status = 400, description = "Invalid ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Shop not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<shop::Model>>, ServiceError> {
    let shop = state.services.catalog.get_shop(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::success(shop)))
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    summary = "List active promotional events",
    responses(
        (status = 200, description = "Active events", body = ApiResponse<Vec<promo_event::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<promo_event::Model>>>, ServiceError> {
    let events = state.services.catalog.list_active_events().await?;
    Ok(Json(ApiResponse::success(events)))
}

#[utoipa::path(
    get,
    path = "/api/v1/provinces",
    summary = "List provinces",
    responses(
        (status = 200, description = "Provinces not marked deleted", body = ApiResponse<Vec<province::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_provinces(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<province::Model>>>, ServiceError> {
    let provinces = state.services.catalog.list_provinces().await?;
    Ok(Json(ApiResponse::success(provinces)))
}

#[utoipa::path(
    get,
    path = "/api/v1/provinces/{id}",
    summary = "Get province with districts",
    params(("id" = i32, Path, description = "Province identifier")),
    responses(
        (status = 200, description = "Province and its districts", body = ApiResponse<ProvinceWithDistricts>),
        (status = 400, description = "Invalid ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Province not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_province(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProvinceWithDistricts>>, ServiceError> {
    let province = state
        .services
        .catalog
        .get_province_with_districts(parse_id(&id)?)
        .await?;
    Ok(Json(ApiResponse::success(province)))
}

#[utoipa::path(
    get,
    path = "/api/v1/districts/{province_id}",
    summary = "List districts of a province",
    params(("province_id" = i32, Path, description = "Province identifier")),
    responses(
        (status = 200, description = "Districts not marked deleted", body = ApiResponse<Vec<district::Model>>),
        (status = 400, description = "Invalid ID", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_districts(
    State(state): State<AppState>,
    Path(province_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<district::Model>>>, ServiceError> {
    let districts = state
        .services
        .catalog
        .list_districts(parse_id(&province_id)?)
        .await?;
    Ok(Json(ApiResponse::success(districts)))
}

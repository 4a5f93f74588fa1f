use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::error::{json_rejection_to_response, service_error_to_response, ApiError};
use crate::app::AppState;
use crate::models::{
    CreateProductRequest, Product, ProductListParams, ProductPage, ProductQuery,
    UpdateProductRequest,
};

/// Paginated, filtered, sorted product listing
#[instrument(name = "list_products", skip(state, params), fields(
    limit = params.limit.as_deref(),
    page = params.page.as_deref(),
    sort = params.sort.as_deref(),
    query = params.query.as_deref(),
))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<ProductPage>, ApiError> {
    let query = ProductQuery::from_params(&params);

    let page = state
        .tracer
        .trace_product_operation("list", None, state.product_service.list_products(&query))
        .await
        .map_err(service_error_to_response)?;

    info!("Returning {} of {} products", page.payload.len(), page.total_count);
    Ok(Json(page))
}

#[instrument(name = "get_product", skip(state), fields(product_id = %product_id))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .tracer
        .trace_product_operation(
            "get",
            Some(product_id.as_str()),
            state.product_service.get_product(&product_id),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "create_product", skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(request) = payload.map_err(json_rejection_to_response)?;

    let product = state
        .tracer
        .trace_product_operation("create", None, state.product_service.create_product(request))
        .await
        .map_err(service_error_to_response)?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(name = "update_product", skip(state, payload), fields(product_id = %product_id))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(request) = payload.map_err(json_rejection_to_response)?;

    state
        .tracer
        .trace_product_operation(
            "update",
            Some(product_id.as_str()),
            state.product_service.update_product(&product_id, request),
        )
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "delete_product", skip(state), fields(product_id = %product_id))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .tracer
        .trace_product_operation(
            "delete",
            Some(product_id.as_str()),
            state.product_service.delete_product(&product_id),
        )
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Product {} deleted", product_id),
    })))
}

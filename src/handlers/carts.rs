use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::error::{json_rejection_to_response, service_error_to_response, ApiError};
use crate::app::AppState;
use crate::models::{Cart, CartMutationResponse, CartView, UpdateQuantityRequest};

fn mutation(message: &str, cart: Cart) -> Json<CartMutationResponse> {
    Json(CartMutationResponse {
        message: message.to_string(),
        cart,
    })
}

#[instrument(name = "create_cart", skip(state))]
pub async fn create_cart(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Cart>), ApiError> {
    let cart = state
        .tracer
        .trace_cart_operation("create", None, state.cart_service.create_cart())
        .await
        .map_err(service_error_to_response)?;

    Ok((StatusCode::CREATED, Json(cart)))
}

#[instrument(name = "get_cart", skip(state), fields(cart_id = %cart_id))]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    state
        .tracer
        .trace_cart_operation("get", Some(cart_id.as_str()), state.cart_service.get_cart(&cart_id))
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "add_product_to_cart", skip(state), fields(cart_id = %cart_id, product_id = %product_id))]
pub async fn add_product(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<CartMutationResponse>), ApiError> {
    let cart = state
        .tracer
        .trace_cart_operation(
            "add_product",
            Some(cart_id.as_str()),
            state.cart_service.add_product(&cart_id, &product_id),
        )
        .await
        .map_err(service_error_to_response)?;

    Ok((StatusCode::CREATED, mutation("Product added to cart", cart)))
}

#[instrument(name = "remove_product_from_cart", skip(state), fields(cart_id = %cart_id, product_id = %product_id))]
pub async fn remove_product(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(String, String)>,
) -> Result<Json<CartMutationResponse>, ApiError> {
    let cart = state
        .tracer
        .trace_cart_operation(
            "remove_product",
            Some(cart_id.as_str()),
            state.cart_service.remove_product(&cart_id, &product_id),
        )
        .await
        .map_err(service_error_to_response)?;

    Ok(mutation("Product removed from cart", cart))
}

#[instrument(name = "set_cart_quantity", skip(state, payload), fields(cart_id = %cart_id, product_id = %product_id))]
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((cart_id, product_id)): Path<(String, String)>,
    payload: Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Json<CartMutationResponse>, ApiError> {
    let Json(request) = payload.map_err(json_rejection_to_response)?;

    let cart = state
        .tracer
        .trace_cart_operation(
            "set_quantity",
            Some(cart_id.as_str()),
            state
                .cart_service
                .set_quantity(&cart_id, &product_id, request.quantity),
        )
        .await
        .map_err(service_error_to_response)?;

    Ok(mutation("Product quantity updated", cart))
}

#[instrument(name = "clear_cart", skip(state), fields(cart_id = %cart_id))]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartMutationResponse>, ApiError> {
    let cart = state
        .tracer
        .trace_cart_operation("clear", Some(cart_id.as_str()), state.cart_service.clear_cart(&cart_id))
        .await
        .map_err(service_error_to_response)?;

    Ok(mutation("Cart emptied", cart))
}

#[instrument(name = "delete_cart", skip(state), fields(cart_id = %cart_id))]
pub async fn delete_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .tracer
        .trace_cart_operation("delete", Some(cart_id.as_str()), state.cart_service.delete_cart(&cart_id))
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Cart {} deleted", cart_id),
    })))
}

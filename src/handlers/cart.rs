//! Line-item endpoints
//!
//! POST /api/orders/{id}/products adds a product line, PUT
//! /api/orders/{id}/quantities re-quantifies the cart in one batch. Both keep
//! stock counts consistent through `services::cart`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info};

use crate::models::cart::{AddProductRequest, CartUpdatedResponse, UpdateQuantitiesRequest};
use crate::models::common::ErrorResponse;
use crate::services::cart::{self, CartError};
use crate::AppState;

/// Add product endpoint handler
///
/// POST /api/orders/{id}/products
///
/// Resolves `id_or_sku` as a primary key first, then as a SKU. Tracked
/// products are clamped against available stock; the clamp is silent, only
/// the persisted quantity reveals it.
pub async fn add_product(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<AddProductRequest>,
) -> Result<Json<CartUpdatedResponse>, (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        order_id,
        id_or_sku = %payload.id_or_sku,
        new_quantity = ?payload.new_quantity,
        "add product request received"
    );

    let id_or_sku = payload.id_or_sku.trim();
    if id_or_sku.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "id_or_sku is required".to_string(),
                code: Some("VALIDATION_FAILED".to_string()),
            }),
        ));
    }

    let result = cart::add_product(
        &state.db,
        order_id,
        id_or_sku,
        payload.new_quantity.unwrap_or(1),
    )
    .await
    .map_err(|e| {
        error!(correlation_id = %correlation_id, error = %e, "add product failed");
        map_cart_error(e)
    })?;

    Ok(Json(CartUpdatedResponse {
        message: update_message(result.changed),
        changed: result.changed,
        order: result.order,
    }))
}

/// Update quantities endpoint handler
///
/// PUT /api/orders/{id}/quantities
///
/// Batch operation over one stock snapshot: lines absent from the map (or
/// mapped to 0) are removed and restocked, increases are clamped against
/// available stock.
pub async fn update_quantities(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<UpdateQuantitiesRequest>,
) -> Result<Json<CartUpdatedResponse>, (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        order_id,
        items = payload.quantity.len(),
        "update quantities request received"
    );

    let result = cart::update_quantities(&state.db, order_id, &payload.quantity)
        .await
        .map_err(|e| {
            error!(correlation_id = %correlation_id, error = %e, "update quantities failed");
            map_cart_error(e)
        })?;

    Ok(Json(CartUpdatedResponse {
        message: update_message(result.changed),
        changed: result.changed,
        order: result.order,
    }))
}

fn update_message(changed: bool) -> String {
    if changed {
        "Order Updated.".to_string()
    } else {
        "Not Updated.".to_string()
    }
}

/// Map CartError to HTTP response
pub(crate) fn map_cart_error(err: CartError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        CartError::OrderNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Order Not Found.".to_string(),
                code: Some("ORDER_NOT_FOUND".to_string()),
            }),
        ),
        CartError::ProductNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No Product Found.".to_string(),
                code: Some("PRODUCT_NOT_FOUND".to_string()),
            }),
        ),
        CartError::DuplicateProduct(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Product Is Already In This Order.".to_string(),
                code: Some("DUPLICATE_PRODUCT".to_string()),
            }),
        ),
        CartError::OutOfStock(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Stock Out.".to_string(),
                code: Some("OUT_OF_STOCK".to_string()),
            }),
        ),
        CartError::Db(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Database error: {}", e),
                code: Some("DB_ERROR".to_string()),
            }),
        ),
    }
}

//! Admin order endpoints
//!
//! Listing, show-with-related, the single-order field editor, bulk status
//! changes, invoice batch loads and the destructive delete (restock first).

use axum::{
    extract::{Path, Query, State},
    http::{header::HeaderMap, StatusCode},
    Json,
};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tracing::{error, info, warn};

use crate::config::{AppConfig, ZONE_INSIDE_DHAKA, ZONE_OUTSIDE_DHAKA};
use crate::entities::{orders, prelude::Orders};
use crate::handlers::cart::map_cart_error;
use crate::models::common::ErrorResponse;
use crate::models::order::{
    BulkStatusRequest, BulkStatusResponse, InvoicesQuery, InvoicesResponse, ListOrdersQuery,
    ListOrdersResponse, OrderDeletedResponse, OrderUpdatedResponse, ShowOrderResponse,
    UpdateOrderRequest,
};
use crate::services::cart;
use crate::services::orders::{self as order_service, OrderUpdate, OrderUpdateError};
use crate::AppState;

lazy_static::lazy_static! {
    /// Strict international mobile pattern: +8801 followed by nine digits
    static ref PHONE_RE: regex::Regex = regex::Regex::new(r"^\+8801\d{9}$").unwrap();
}

/// Handler for GET /api/orders
/// Newest-first listing with optional phone/status filters
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ListOrdersResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut find = Orders::find().order_by_desc(orders::Column::Id);
    if let Some(phone) = query.phone.as_deref().filter(|p| !p.is_empty()) {
        find = find.filter(orders::Column::Phone.eq(phone));
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        find = find.filter(orders::Column::Status.eq(status));
    }

    let orders = find.all(&state.db).await.map_err(db_error)?;
    Ok(Json(ListOrdersResponse { orders }))
}

/// Handler for GET /api/orders/{id}
/// The order plus the same customer's other orders (matched by phone)
pub async fn show_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<Json<ShowOrderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let order = Orders::find_by_id(order_id)
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(order_not_found)?;

    let related_orders = Orders::find()
        .filter(orders::Column::Phone.eq(order.phone.clone()))
        .filter(orders::Column::Id.ne(order.id))
        .order_by_desc(orders::Column::Id)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    Ok(Json(ShowOrderResponse {
        order,
        related_orders,
    }))
}

/// Order update endpoint handler
///
/// PUT /api/orders/{id}
///
/// Normalizes the phone to international form, validates, resolves the
/// shipping cost (delivery_charge setting first, configured rates as
/// fallback) and persists through the editor service.
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<OrderUpdatedResponse>, (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        order_id,
        status = %payload.status,
        "order update request received"
    );

    let phone = normalize_phone(&payload.phone);
    let (discount, advanced) = validate_update_order(&payload, &phone, &state.config)?;

    let charge = state.settings.delivery_charge(&state.db).await;
    let shipping_cost =
        order_service::resolve_shipping_cost(charge.as_ref(), &state.config, &payload.shipping);

    let update = OrderUpdate {
        name: payload.name,
        phone,
        email: payload.email,
        address: payload.address,
        note: payload.note,
        status: payload.status,
        shipping_area: payload.shipping,
        shipping_cost,
        discount,
        advanced,
    };

    let order = order_service::apply_update(
        &state.db,
        &state.config.shipping_status,
        order_id,
        update,
    )
    .await
    .map_err(|e| {
        error!(correlation_id = %correlation_id, error = %e, "order update failed");
        map_order_update_error(e)
    })?;

    Ok(Json(OrderUpdatedResponse {
        message: "Order Has Been Updated.".to_string(),
        order,
    }))
}

/// Bulk status endpoint handler
///
/// POST /api/orders/status
///
/// One UPDATE across the id list. Targeting the shipping status stamps
/// shipped_at on every order without a per-row prior-status check.
pub async fn bulk_status(
    State(state): State<AppState>,
    Json(payload): Json<BulkStatusRequest>,
) -> Result<Json<BulkStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !state.config.is_known_status(&payload.status) {
        return Err(validation_error(format!(
            "Unknown order status '{}'",
            payload.status
        )));
    }
    if payload.order_ids.is_empty() {
        return Err(validation_error("order_ids must not be empty".to_string()));
    }

    let updated = order_service::bulk_status_update(
        &state.db,
        &state.config.shipping_status,
        &payload.order_ids,
        &payload.status,
    )
    .await
    .map_err(db_error)?;

    info!(updated, status = %payload.status, "bulk status update applied");

    Ok(Json(BulkStatusResponse {
        message: "Order Status Has Been Updated.".to_string(),
        updated,
    }))
}

/// Handler for GET /api/orders/invoices?order_id=1,2,3
/// Batch load for the invoice print view
pub async fn invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoicesQuery>,
) -> Result<Json<InvoicesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let order_ids = parse_order_ids(&query.order_id);
    if order_ids.is_empty() {
        return Err(validation_error("order_id is required".to_string()));
    }

    let orders = Orders::find()
        .filter(orders::Column::Id.is_in(order_ids))
        .order_by_desc(orders::Column::Id)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    Ok(Json(InvoicesResponse { orders }))
}

/// Order delete endpoint handler
///
/// DELETE /api/orders/{id}
///
/// Admin-key gated. Restocks every tracked, still-existing product by its
/// line quantity before the order row is removed.
pub async fn destroy_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<i32>,
) -> Result<Json<OrderDeletedResponse>, (StatusCode, Json<ErrorResponse>)> {
    check_admin_auth(&state.config, &headers)?;

    cart::restock_and_delete(&state.db, order_id)
        .await
        .map_err(|e| {
            error!(order_id, error = %e, "order delete failed");
            map_cart_error(e)
        })?;

    info!(order_id, "order deleted");

    Ok(Json(OrderDeletedResponse {
        message: "Order Has Been Deleted.".to_string(),
    }))
}

/// Rewrite a local-format number (leading 0) to the international prefix
fn normalize_phone(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('0') {
        format!("+88{}", raw)
    } else {
        raw.to_string()
    }
}

/// Validate an order edit; returns the required (discount, advanced) pair
fn validate_update_order(
    payload: &UpdateOrderRequest,
    phone: &str,
    config: &AppConfig,
) -> Result<(i64, i64), (StatusCode, Json<ErrorResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(validation_error("Name is required".to_string()));
    }
    if payload.address.trim().is_empty() {
        return Err(validation_error("Address is required".to_string()));
    }
    if !PHONE_RE.is_match(phone) {
        return Err(validation_error(format!(
            "Phone '{}' is not a valid +8801 mobile number",
            phone
        )));
    }
    if !config.is_known_status(&payload.status) {
        return Err(validation_error(format!(
            "Unknown order status '{}'",
            payload.status
        )));
    }
    if payload.shipping != ZONE_INSIDE_DHAKA && payload.shipping != ZONE_OUTSIDE_DHAKA {
        return Err(validation_error(format!(
            "Shipping must be '{}' or '{}'",
            ZONE_INSIDE_DHAKA, ZONE_OUTSIDE_DHAKA
        )));
    }
    let discount = payload
        .discount
        .ok_or_else(|| validation_error("Discount is required".to_string()))?;
    let advanced = payload
        .advanced
        .ok_or_else(|| validation_error("Advanced is required".to_string()))?;

    Ok((discount, advanced))
}

/// Comma-separated id list: trimmed, empty and non-numeric segments dropped
fn parse_order_ids(raw: &str) -> Vec<i32> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i32>().ok())
        .collect()
}

/// Check admin authentication via X-API-Key header
fn check_admin_auth(
    config: &AppConfig,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let Some(admin_key) = config.admin_api_key.as_deref() else {
        error!("ADMIN_API_KEY not configured");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Server configuration error".to_string(),
                code: Some("CONFIG_ERROR".to_string()),
            }),
        ));
    };

    let provided_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided_key != admin_key {
        warn!("Invalid or missing API key for order delete");
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Not Allowed.".to_string(),
                code: Some("FORBIDDEN".to_string()),
            }),
        ));
    }

    Ok(())
}

fn validation_error(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: message,
            code: Some("VALIDATION_FAILED".to_string()),
        }),
    )
}

fn order_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Order Not Found.".to_string(),
            code: Some("ORDER_NOT_FOUND".to_string()),
        }),
    )
}

fn db_error(e: DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %e, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
            code: Some("DB_ERROR".to_string()),
        }),
    )
}

fn map_order_update_error(err: OrderUpdateError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        OrderUpdateError::OrderNotFound(_) => order_not_found(),
        OrderUpdateError::Db(e) => db_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> AppConfig {
        AppConfig {
            statuses: vec![
                "Pending".to_string(),
                "Confirmed".to_string(),
                "Shipping".to_string(),
                "Delivered".to_string(),
                "Cancelled".to_string(),
            ],
            shipping_status: "Shipping".to_string(),
            inside_dhaka_rate: dec!(60),
            outside_dhaka_rate: dec!(120),
            admin_api_key: Some("secret".to_string()),
        }
    }

    fn valid_request() -> UpdateOrderRequest {
        UpdateOrderRequest {
            name: "Rahim Uddin".to_string(),
            phone: "01712345678".to_string(),
            email: None,
            address: "House 7, Road 3, Dhanmondi".to_string(),
            note: None,
            status: "Confirmed".to_string(),
            shipping: ZONE_INSIDE_DHAKA.to_string(),
            discount: Some(0),
            advanced: Some(100),
        }
    }

    #[test]
    fn test_normalize_phone_rewrites_local_prefix() {
        assert_eq!(normalize_phone("01712345678"), "+8801712345678");
    }

    #[test]
    fn test_normalize_phone_leaves_international_form() {
        assert_eq!(normalize_phone("+8801712345678"), "+8801712345678");
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_RE.is_match("+8801712345678"));
        assert!(!PHONE_RE.is_match("+88017123"));
        assert!(!PHONE_RE.is_match("+8802712345678"));
        assert!(!PHONE_RE.is_match("01712345678"));
    }

    #[test]
    fn test_validate_accepts_valid_request() {
        let req = valid_request();
        let phone = normalize_phone(&req.phone);
        assert_eq!(validate_update_order(&req, &phone, &config()).ok(), Some((0, 100)));
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let mut req = valid_request();
        req.name = "  ".to_string();
        let phone = normalize_phone(&req.phone);
        let (status, _) = validate_update_order(&req, &phone, &config()).unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_validate_rejects_bad_phone() {
        let mut req = valid_request();
        req.phone = "12345".to_string();
        let phone = normalize_phone(&req.phone);
        assert!(validate_update_order(&req, &phone, &config()).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_status() {
        let mut req = valid_request();
        req.status = "Teleported".to_string();
        let phone = normalize_phone(&req.phone);
        assert!(validate_update_order(&req, &phone, &config()).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_zone() {
        let mut req = valid_request();
        req.shipping = "Mars".to_string();
        let phone = normalize_phone(&req.phone);
        assert!(validate_update_order(&req, &phone, &config()).is_err());
    }

    #[test]
    fn test_validate_requires_discount_and_advanced() {
        let mut req = valid_request();
        req.discount = None;
        let phone = normalize_phone(&req.phone);
        assert!(validate_update_order(&req, &phone, &config()).is_err());

        let mut req = valid_request();
        req.advanced = None;
        assert!(validate_update_order(&req, &phone, &config()).is_err());
    }

    #[test]
    fn test_parse_order_ids_trims_and_filters() {
        assert_eq!(parse_order_ids("1, 2 ,,x,3"), vec![1, 2, 3]);
        assert!(parse_order_ids(",,,").is_empty());
    }

    #[test]
    fn test_check_admin_auth_rejects_wrong_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "wrong".parse().unwrap());
        let (status, _) = check_admin_auth(&config(), &headers).unwrap_err();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_check_admin_auth_accepts_matching_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());
        assert!(check_admin_auth(&config(), &headers).is_ok());
    }

    #[test]
    fn test_check_admin_auth_without_configured_key_is_server_error() {
        let mut cfg = config();
        cfg.admin_api_key = None;
        let (status, _) = check_admin_auth(&cfg, &HeaderMap::new()).unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

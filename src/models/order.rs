//! Order editor and browsing request/response models

use serde::{Deserialize, Serialize};

use crate::entities::orders;

/// Admin edit of an order's contact, shipping, status and discount fields.
///
/// `phone` may arrive in local format (leading 0); it is normalized to the
/// international prefix before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    #[serde(default)]
    pub note: Option<String>,
    /// Must be one of the configured order statuses
    pub status: String,
    /// Delivery zone, one of "Inside Dhaka" / "Outside Dhaka"
    pub shipping: String,
    /// Required integer (taka)
    #[serde(default)]
    pub discount: Option<i64>,
    /// Advance payment, required integer (taka)
    #[serde(default)]
    pub advanced: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdatedResponse {
    pub message: String,
    pub order: orders::Model,
}

/// Batch status change across a set of orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusRequest {
    pub status: String,
    pub order_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStatusResponse {
    pub message: String,
    /// Number of orders the update touched
    pub updated: u64,
}

/// Query params for GET /api/orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<orders::Model>,
}

/// One order plus the same customer's other orders (matched by phone)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowOrderResponse {
    pub order: orders::Model,
    pub related_orders: Vec<orders::Model>,
}

/// Query params for GET /api/orders/invoices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicesQuery {
    /// Comma-separated order ids, e.g. "12, 14,15"
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicesResponse {
    pub orders: Vec<orders::Model>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeletedResponse {
    pub message: String,
}

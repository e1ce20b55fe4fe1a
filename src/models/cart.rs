//! Line-item manager request/response models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::orders;

/// Add a product line to an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProductRequest {
    /// Product primary key or SKU; tried as an id first
    pub id_or_sku: String,
    /// Requested quantity, defaults to 1; clamped against available stock
    #[serde(default)]
    pub new_quantity: Option<i32>,
}

/// Batch re-quantification of an order's lines.
///
/// Keys are product ids. A line whose product id is absent from the map, or
/// mapped to 0, is removed (and restocked when the product tracks stock).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuantitiesRequest {
    pub quantity: HashMap<i32, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUpdatedResponse {
    pub message: String,
    /// Whether the persisted order actually changed
    pub changed: bool,
    pub order: orders::Model,
}

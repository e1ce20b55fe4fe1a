//! DB-backed settings with a short-lived cache
//!
//! Admin-editable rates live in the `settings` table so they can change
//! without a deploy. Lookups are cached briefly; a missing or malformed row
//! resolves to `None` and callers fall back to `AppConfig` rates.

use moka::future::Cache;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::entities::{prelude::Settings, settings};

const DELIVERY_CHARGE_KEY: &str = "delivery_charge";

/// Per-zone delivery rates, stored as the `delivery_charge` settings row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCharge {
    pub inside_dhaka: Decimal,
    pub outside_dhaka: Decimal,
}

#[derive(Clone)]
pub struct SettingsService {
    cache: Arc<Cache<String, DeliveryCharge>>,
}

impl SettingsService {
    pub fn new(cache_ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(cache_ttl_secs))
            .build();

        Self {
            cache: Arc::new(cache),
        }
    }

    /// The delivery_charge row, if present and well-formed.
    pub async fn delivery_charge(&self, db: &DatabaseConnection) -> Option<DeliveryCharge> {
        if let Some(cached) = self.cache.get(DELIVERY_CHARGE_KEY).await {
            return Some(cached);
        }

        let row = Settings::find()
            .filter(settings::Column::Key.eq(DELIVERY_CHARGE_KEY))
            .one(db)
            .await
            .map_err(|e| warn!(error = %e, "failed to load delivery_charge setting"))
            .ok()??;

        match serde_json::from_value::<DeliveryCharge>(row.value) {
            Ok(charge) => {
                self.cache
                    .insert(DELIVERY_CHARGE_KEY.to_string(), charge.clone())
                    .await;
                Some(charge)
            }
            Err(e) => {
                warn!(error = %e, "malformed delivery_charge setting");
                None
            }
        }
    }
}

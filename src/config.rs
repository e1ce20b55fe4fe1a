//! Environment-backed application configuration
//!
//! Parsed once at startup into `AppConfig` and carried in `AppState`. The
//! DB-backed `settings` table (see `services::settings`) takes precedence over
//! the fallback shipping rates configured here.

use rust_decimal::Decimal;
use std::env;

/// Delivery zone names accepted by the order editor
pub const ZONE_INSIDE_DHAKA: &str = "Inside Dhaka";
pub const ZONE_OUTSIDE_DHAKA: &str = "Outside Dhaka";

const DEFAULT_STATUSES: &str = "Pending,Confirmed,Shipping,Delivered,Cancelled";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Ordered set of order lifecycle statuses
    pub statuses: Vec<String>,
    /// The status that gates the shipped_at stamp
    pub shipping_status: String,
    /// Fallback shipping rate when the delivery_charge setting has no entry
    pub inside_dhaka_rate: Decimal,
    /// Fallback shipping rate for everything outside the near zone
    pub outside_dhaka_rate: Decimal,
    /// API key required for the destructive order-delete endpoint
    pub admin_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let statuses = parse_statuses(
            &env::var("ORDER_STATUSES").unwrap_or_else(|_| DEFAULT_STATUSES.to_string()),
        );
        let shipping_status =
            env::var("SHIPPING_STATUS").unwrap_or_else(|_| "Shipping".to_string());

        let inside_dhaka_rate = parse_rate(env::var("SHIPPING_RATE_INSIDE_DHAKA").ok(), 60);
        let outside_dhaka_rate = parse_rate(env::var("SHIPPING_RATE_OUTSIDE_DHAKA").ok(), 120);

        Self {
            statuses,
            shipping_status,
            inside_dhaka_rate,
            outside_dhaka_rate,
            admin_api_key: env::var("ADMIN_API_KEY").ok(),
        }
    }

    pub fn is_known_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }
}

fn parse_statuses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_rate(raw: Option<String>, default: i64) -> Decimal {
    raw.and_then(|v| v.parse::<Decimal>().ok())
        .unwrap_or_else(|| Decimal::from(default))
}

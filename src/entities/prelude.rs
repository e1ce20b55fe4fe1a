pub use super::orders::Entity as Orders;
pub use super::products::Entity as Products;
pub use super::settings::Entity as Settings;

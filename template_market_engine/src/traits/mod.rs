//! The traits a storage backend (and the gateway adapter) must implement to power the marketplace engine.

mod catalog;
mod order_management;
mod payment_gateway;
mod settlement_database;

pub use catalog::TemplateCatalog;
pub use order_management::OrderManagement;
pub use payment_gateway::{GatewayError, PaymentGateway, RemoteIntent, RemoteIntentRequest};
pub use settlement_database::{SettlementDatabase, SettlementError, SettlementUpdate};

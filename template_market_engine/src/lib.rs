//! Template Marketplace Engine
//!
//! The settlement engine for the template marketplace: sellers list templates, buyers purchase licenses, payments
//! settle through a gateway, and earnings accrue to sellers net of the platform fee. This library contains the core
//! order and payment logic. It is transport-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the database directly.
//!    Instead, use the public API provided by the engine. The exception is the data types used in the database, which
//!    are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@tme_api`]). This provides the public-facing functionality of the engine: order
//!    lifecycle management ([`OrderFlowApi`]) and payment settlement ([`SettlementApi`]). Backends implement the
//!    traits in the [`mod@traits`] module in order to power these APIs.
//!
//! Every settlement transition is expressed as an atomic conditional update against the store, so concurrent webhook
//! deliveries and client confirmations for the same payment resolve to exactly one terminal transition.

pub mod db_types;
pub mod helpers;
pub mod tme_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use tme_api::{
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_objects,
    settlement_api::SettlementApi,
};
pub use traits::{OrderManagement, PaymentGateway, SettlementDatabase, SettlementError, TemplateCatalog};

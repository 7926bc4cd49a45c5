//! The public API of the marketplace engine.
//!
//! [`order_flow_api::OrderFlowApi`] owns the order lifecycle (creation, cancellation, refunds, the download gate and
//! seller reporting). [`settlement_api::SettlementApi`] owns payment settlement (checkout, webhook capture, client
//! verification, failure and refund paths) and the cascades that keep orders consistent with their payments.

pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod settlement_api;

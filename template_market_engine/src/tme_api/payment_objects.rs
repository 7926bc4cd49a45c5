use serde::{Deserialize, Serialize};
use tmg_common::Money;

use crate::db_types::Payment;

/// What a buyer needs to drive the gateway's checkout UI after initiating payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub payment_id: i64,
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
}

/// A verified `payment.captured` gateway event, reduced to the fields settlement acts on. The transport layer has
/// already authenticated the payload; `amount_minor` stays in minor units so the equality check against the stored
/// payment is exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCapture {
    pub gateway_order_id: String,
    pub transaction_id: String,
    pub amount_minor: i64,
    pub currency: String,
    /// The full webhook payload, retained verbatim on the payment record.
    pub raw_payload: String,
}

/// The client-confirmation counterpart of a webhook capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub payment_id: i64,
    pub gateway_order_id: String,
    pub transaction_id: String,
}

/// How a webhook delivery was resolved. All three outcomes are acknowledged with success to the gateway; only the
/// first actually changed state.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// This delivery won the settlement race and the order was completed.
    Settled(Payment),
    /// The payment was already terminal; nothing changed.
    AlreadyProcessed,
    /// No payment matches the remote order id. Not this system's concern; the gateway must not retry.
    UnknownPayment,
}

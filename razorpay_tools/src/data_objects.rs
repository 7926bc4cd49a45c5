use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only webhook event the settlement flow acts on. Everything else is acknowledged and ignored.
pub const PAYMENT_CAPTURED_EVENT: &str = "payment.captured";

/// Request body for creating a remote order against the gateway. Amounts are in minor units (paise).
#[derive(Debug, Clone, Serialize)]
pub struct RemoteOrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// A remote order (payment intent) as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The webhook envelope posted by the gateway. The full payload is retained verbatim on the payment record, so this
/// struct only names the fields the settlement flow reads.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

/// The payment entity nested inside a `payment.captured` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedPaymentEntity {
    /// The remote capture (transaction) id.
    pub id: String,
    /// The remote order id the capture settles.
    pub order_id: String,
    /// Captured amount in minor units.
    pub amount: i64,
    pub currency: String,
}

impl WebhookEvent {
    pub fn is_payment_captured(&self) -> bool {
        self.event == PAYMENT_CAPTURED_EVENT
    }

    /// Extracts the captured-payment entity from a `payment.captured` envelope.
    pub fn captured_payment(&self) -> Option<CapturedPaymentEntity> {
        self.payload
            .pointer("/payment/entity")
            .and_then(|entity| serde_json::from_value(entity.clone()).ok())
    }
}

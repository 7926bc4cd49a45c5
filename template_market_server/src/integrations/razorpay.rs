//! Bridges the gateway client crate into the engine's [`PaymentGateway`] boundary, and converts raw webhook bodies
//! into the engine's capture object.

use log::warn;
use razorpay_tools::{RazorpayApi, RazorpayApiError, RemoteOrderRequest, WebhookEvent};
use template_market_engine::{
    payment_objects::PaymentCapture,
    traits::{GatewayError, PaymentGateway, RemoteIntent, RemoteIntentRequest},
};

pub const GATEWAY_NAME: &str = "Razorpay";

/// The signature header the gateway attaches to webhook deliveries.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(api: RazorpayApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &str {
        GATEWAY_NAME
    }

    async fn create_remote_intent(&self, request: RemoteIntentRequest) -> Result<RemoteIntent, GatewayError> {
        let remote = self
            .api
            .create_order(RemoteOrderRequest {
                amount: request.amount_minor,
                currency: request.currency,
                receipt: request.receipt,
            })
            .await
            .map_err(|e| match e {
                RazorpayApiError::QueryError { status, message } => {
                    GatewayError::Rejected(format!("Gateway returned {status}: {message}"))
                },
                e => GatewayError::Unreachable(e.to_string()),
            })?;
        Ok(RemoteIntent { id: remote.id, amount_minor: remote.amount, currency: remote.currency })
    }
}

/// Reduces a verified webhook body to the engine's capture object.
///
/// Returns `Ok(None)` for events the settlement flow does not act on (anything other than `payment.captured`, or a
/// capture envelope missing its payment entity). Those are acknowledged to the gateway without further processing.
/// Only an unparseable body is an error.
pub fn capture_from_webhook_body(body: &[u8]) -> Result<Option<PaymentCapture>, serde_json::Error> {
    let event: WebhookEvent = serde_json::from_slice(body)?;
    if !event.is_payment_captured() {
        return Ok(None);
    }
    let Some(entity) = event.captured_payment() else {
        warn!("🛒️ payment.captured event without a payment entity; acknowledging and ignoring");
        return Ok(None);
    };
    Ok(Some(PaymentCapture {
        gateway_order_id: entity.order_id,
        transaction_id: entity.id,
        amount_minor: entity.amount,
        currency: entity.currency,
        raw_payload: String::from_utf8_lossy(body).into_owned(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn capture_events_are_reduced() {
        let body = serde_json::json!({
            "event": "payment.captured",
            "payload": { "payment": { "entity": {
                "id": "pay_1", "order_id": "order_1", "amount": 100_000, "currency": "INR"
            }}}
        })
        .to_string();
        let capture = capture_from_webhook_body(body.as_bytes()).unwrap().unwrap();
        assert_eq!(capture.gateway_order_id, "order_1");
        assert_eq!(capture.transaction_id, "pay_1");
        assert_eq!(capture.amount_minor, 100_000);
        assert_eq!(capture.raw_payload, body);
    }

    #[test]
    fn irrelevant_events_are_ignored() {
        let body = br#"{"event":"order.paid","payload":{}}"#;
        assert!(capture_from_webhook_body(body).unwrap().is_none());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(capture_from_webhook_body(b"not json").is_err());
    }
}

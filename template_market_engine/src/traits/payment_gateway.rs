use thiserror::Error;

/// The gateway-side order (payment intent) created for a checkout. Amounts are in minor units, matching what the
/// gateway will later report in its capture webhook.
#[derive(Debug, Clone)]
pub struct RemoteIntent {
    pub id: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct RemoteIntentRequest {
    pub amount_minor: i64,
    pub currency: String,
    /// A receipt tag tying the remote intent back to the local order, for gateway-side bookkeeping.
    pub receipt: String,
}

/// The payment gateway boundary.
///
/// Implementations hold their own credentials and are injected into [`crate::SettlementApi`] at construction; no
/// gateway state is ambient. The one blocking external call in the settlement flow is [`Self::create_remote_intent`]
/// during checkout; it is not retried server-side. Clients retry checkout on failure.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// The gateway identifier recorded on payment records, e.g. `Razorpay`.
    fn name(&self) -> &str;

    async fn create_remote_intent(&self, request: RemoteIntentRequest) -> Result<RemoteIntent, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway rejected the request. {0}")]
    Rejected(String),
    #[error("Could not reach the payment gateway. {0}")]
    Unreachable(String),
}

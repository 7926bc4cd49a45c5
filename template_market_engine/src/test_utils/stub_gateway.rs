use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::traits::{GatewayError, PaymentGateway, RemoteIntent, RemoteIntentRequest};

/// A deterministic in-process stand-in for the payment gateway. Remote intent ids are sequential
/// (`order_stub_1`, `order_stub_2`, …) so tests can assert on them; set `fail` to exercise the
/// gateway-unreachable path.
#[derive(Clone, Default)]
pub struct StubGateway {
    counter: Arc<AtomicU64>,
    pub fail: bool,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { counter: Arc::new(AtomicU64::new(0)), fail: true }
    }

    /// How many remote intents have been created so far.
    pub fn intents_created(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for StubGateway {
    fn name(&self) -> &str {
        "Razorpay"
    }

    async fn create_remote_intent(&self, request: RemoteIntentRequest) -> Result<RemoteIntent, GatewayError> {
        if self.fail {
            return Err(GatewayError::Unreachable("stub gateway configured to fail".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteIntent { id: format!("order_stub_{n}"), amount_minor: request.amount_minor, currency: request.currency })
    }
}

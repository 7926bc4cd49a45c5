use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewPayment, Order, Payment, PaymentState, PaymentStatus, UserId},
    tme_api::payment_objects::{CheckoutSummary, PaymentCapture, VerifyPaymentRequest, WebhookOutcome},
    traits::{
        OrderManagement,
        PaymentGateway,
        RemoteIntentRequest,
        SettlementDatabase,
        SettlementError,
        SettlementUpdate,
    },
};

/// `SettlementApi` is the payment state machine: checkout intent creation, webhook-driven capture, client-driven
/// verification, failure/cancel/refund paths, and the cascades that carry a settled payment onto its order.
///
/// The gateway adapter is injected at construction and owned by the API value; settlement never reaches for ambient
/// gateway state. All transitions run as atomic conditional updates in the store, so any number of concurrent
/// webhook deliveries and client confirmations resolve to exactly one terminal transition per payment.
pub struct SettlementApi<B, G> {
    db: B,
    gateway: G,
}

impl<B, G> Debug for SettlementApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, G> SettlementApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway }
    }
}

impl<B, G> SettlementApi<B, G>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    /// Initiates checkout for a pending order.
    ///
    /// An existing `Created`-state payment for the order is reused, so client retries cannot mint duplicate payment
    /// records. If the reused payment already carries a remote intent id, that intent is returned as-is; otherwise a
    /// remote order is created on the gateway and recorded. The gateway call is not retried here; on failure the
    /// client retries checkout.
    pub async fn create_checkout(&self, order_id: i64, buyer: &UserId) -> Result<CheckoutSummary, SettlementError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(SettlementError::OrderNotFound(order_id))?;
        if order.payment_status != PaymentStatus::Pending {
            debug!("💳️ Order #{order_id} is no longer pending; refusing to open checkout");
            return Err(SettlementError::OrderAlreadyProcessed(order_id));
        }
        let payment = self
            .db
            .fetch_or_create_pending_payment(NewPayment {
                order_id: order.id,
                user_id: buyer.clone(),
                gateway: self.gateway.name().to_string(),
                amount: order.price,
                currency: order.currency.clone(),
            })
            .await?;
        let payment = match &payment.gateway_order_id {
            Some(remote_id) => {
                debug!("💳️ Reusing payment #{} with remote intent {remote_id} for order #{order_id}", payment.id);
                payment
            },
            None => {
                let intent = self
                    .gateway
                    .create_remote_intent(RemoteIntentRequest {
                        amount_minor: order.price.minor_units(),
                        currency: order.currency.clone(),
                        receipt: format!("order_{}", order.id),
                    })
                    .await?;
                debug!("💳️ Remote intent {} created for order #{order_id}", intent.id);
                self.db.attach_gateway_order_id(payment.id, &intent.id).await?
            },
        };
        let gateway_order_id = payment
            .gateway_order_id
            .clone()
            .ok_or_else(|| SettlementError::DatabaseError("Payment lost its gateway order id".to_string()))?;
        info!("💳️ Checkout ready: payment #{} / {gateway_order_id} for order #{order_id}", payment.id);
        Ok(CheckoutSummary { payment_id: payment.id, gateway_order_id, amount: payment.amount, currency: payment.currency })
    }

    /// Settles a verified `payment.captured` webhook event. This is the authoritative confirmation path.
    ///
    /// * An unknown remote order id is acknowledged without error. It is not this system's concern, and an error
    ///   would only make the gateway retry forever.
    /// * Amount and currency must match the stored payment exactly (amounts in minor units); a mismatch fails loudly
    ///   and changes nothing.
    /// * The transition to `Success` is conditional on the payment still being non-terminal. A duplicate delivery, or
    ///   a delivery that lost the race against client verification, degrades to an acknowledged no-op.
    /// * The first (and only) successful transition cascades to the order: payment status `Success`, order status
    ///   `Completed`. That cascade is the point of exactly-once purchase fulfilment.
    pub async fn payment_captured(&self, capture: PaymentCapture) -> Result<WebhookOutcome, SettlementError> {
        let payment = match self.db.fetch_payment_by_gateway_order_id(&capture.gateway_order_id).await? {
            Some(p) => p,
            None => {
                info!("💰️ Capture for unknown remote order {} acknowledged and ignored", capture.gateway_order_id);
                return Ok(WebhookOutcome::UnknownPayment);
            },
        };
        self.check_capture_consistency(&payment, &capture)?;
        let update = SettlementUpdate::to_state(PaymentState::Success)
            .with_transaction_id(&capture.transaction_id)
            .with_raw_payload(&capture.raw_payload);
        match self.db.finalize_payment(payment.id, update).await? {
            Some(settled) => {
                let order = self.db.complete_order_for_payment(&settled).await?;
                info!(
                    "💰️ Payment #{} captured ({}); order #{} completed",
                    settled.id, capture.transaction_id, order.id
                );
                Ok(WebhookOutcome::Settled(settled))
            },
            None => {
                debug!("💰️ Payment #{} already finalized; duplicate capture acknowledged", payment.id);
                Ok(WebhookOutcome::AlreadyProcessed)
            },
        }
    }

    /// The client-confirmation path, a UX accelerator alongside the webhook. A payment the webhook already settled
    /// is acknowledged idempotently, since the desired end state was achieved. Racing (or trailing) the webhook is
    /// never an error. Payments that failed, were cancelled or were refunded are rejected.
    pub async fn verify_payment(&self, req: VerifyPaymentRequest) -> Result<Payment, SettlementError> {
        let payment =
            self.db.fetch_payment(req.payment_id).await?.ok_or(SettlementError::PaymentNotFound(req.payment_id))?;
        if payment.status == PaymentState::Success {
            debug!("💰️ Payment #{} is already settled; client verification is a no-op", payment.id);
            return Ok(payment);
        }
        if payment.status.is_final() {
            return Err(SettlementError::PaymentAlreadyFinalized(payment.id));
        }
        let update = SettlementUpdate::to_state(PaymentState::Success)
            .with_gateway_order_id(&req.gateway_order_id)
            .with_transaction_id(&req.transaction_id);
        match self.db.finalize_payment(payment.id, update).await? {
            Some(settled) => {
                let order = self.db.complete_order_for_payment(&settled).await?;
                info!("💰️ Payment #{} verified by client; order #{} completed", settled.id, order.id);
                Ok(settled)
            },
            None => {
                // Lost the race. If the winner also settled to Success, this is the tie-break no-op.
                let current = self
                    .db
                    .fetch_payment(req.payment_id)
                    .await?
                    .ok_or(SettlementError::PaymentNotFound(req.payment_id))?;
                if current.status == PaymentState::Success {
                    debug!("💰️ Payment #{} was settled concurrently; verification degrades to no-op", current.id);
                    Ok(current)
                } else {
                    Err(SettlementError::PaymentAlreadyFinalized(current.id))
                }
            },
        }
    }

    /// Marks a non-terminal payment as failed and cascades the order to `Failed`/`Cancelled`.
    pub async fn fail_payment(&self, payment_id: i64, reason: &str) -> Result<Payment, SettlementError> {
        let update = SettlementUpdate::to_state(PaymentState::Failed).with_failure_reason(reason);
        self.finalize_unsettled(payment_id, update).await
    }

    /// Marks a non-terminal payment as cancelled and cascades the order to `Failed`/`Cancelled`.
    pub async fn cancel_payment(&self, payment_id: i64) -> Result<Payment, SettlementError> {
        let update = SettlementUpdate::to_state(PaymentState::Cancelled);
        self.finalize_unsettled(payment_id, update).await
    }

    async fn finalize_unsettled(&self, payment_id: i64, update: SettlementUpdate) -> Result<Payment, SettlementError> {
        let new_state = update.new_state;
        match self.db.finalize_payment(payment_id, update).await? {
            Some(payment) => {
                let order = self.db.fail_order_for_payment(&payment).await?;
                info!("💰️ Payment #{payment_id} marked {new_state}; order #{} cancelled", order.id);
                Ok(payment)
            },
            None => match self.db.fetch_payment(payment_id).await? {
                Some(p) => Err(SettlementError::PaymentAlreadyFinalized(p.id)),
                None => Err(SettlementError::PaymentNotFound(payment_id)),
            },
        }
    }

    /// Administrative refund. Only a `Success` payment can be refunded; the guard also means `refunded_at` can never
    /// be stamped twice. Cascades the order to `Refunded`/`Refunded`.
    pub async fn refund_payment(&self, payment_id: i64) -> Result<Payment, SettlementError> {
        match self.db.refund_payment(payment_id).await? {
            Some(payment) => {
                let order = self.db.refund_order_for_payment(&payment).await?;
                info!("💰️ Payment #{payment_id} refunded; order #{} refunded", order.id);
                Ok(payment)
            },
            None => match self.db.fetch_payment(payment_id).await? {
                Some(p) => Err(SettlementError::PaymentNotRefundable(p.id)),
                None => Err(SettlementError::PaymentNotFound(payment_id)),
            },
        }
    }

    /// Repairs the crash window between a payment transition and its order cascade.
    ///
    /// No transaction spans the two records, so a crash can leave a terminal payment next to a stale order. This
    /// re-derives the order's statuses from its most significant payment (`Success` ≻ `Refunded` ≻
    /// `Failed`/`Cancelled`) and applies the missing cascade. Safe to run at any time; an order that is already
    /// consistent is returned unchanged.
    pub async fn reconcile_order(&self, order_id: i64) -> Result<Order, SettlementError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(SettlementError::OrderNotFound(order_id))?;
        let payments = self.db.fetch_payments_for_order(order_id).await?;
        let winner = payments
            .iter()
            .find(|p| p.status == PaymentState::Success)
            .or_else(|| payments.iter().find(|p| p.status == PaymentState::Refunded))
            .or_else(|| payments.iter().find(|p| matches!(p.status, PaymentState::Failed | PaymentState::Cancelled)));
        let Some(payment) = winner else {
            debug!("🔧️ Order #{order_id} has no terminal payments; nothing to reconcile");
            return Ok(order);
        };
        let repaired = match payment.status {
            PaymentState::Success => self.db.complete_order_for_payment(payment).await?,
            PaymentState::Refunded => self.db.refund_order_for_payment(payment).await?,
            _ => self.db.fail_order_for_payment(payment).await?,
        };
        if repaired.payment_status != order.payment_status || repaired.status != order.status {
            warn!(
                "🔧️ Order #{order_id} was stale ({}/{}); reconciled to {}/{} from payment #{}",
                order.payment_status, order.status, repaired.payment_status, repaired.status, payment.id
            );
        }
        Ok(repaired)
    }

    fn check_capture_consistency(&self, payment: &Payment, capture: &PaymentCapture) -> Result<(), SettlementError> {
        if capture.amount_minor != payment.amount.minor_units() {
            error!(
                "💰️ Amount mismatch on payment #{}: gateway captured {} minor units, expected {}. Manual \
                 investigation required.",
                payment.id,
                capture.amount_minor,
                payment.amount.minor_units()
            );
            return Err(SettlementError::AmountMismatch {
                id: payment.id,
                expected: payment.amount.minor_units(),
                actual: capture.amount_minor,
            });
        }
        if capture.currency != payment.currency {
            error!(
                "💰️ Currency mismatch on payment #{}: gateway captured {}, expected {}. Manual investigation \
                 required.",
                payment.id, capture.currency, payment.currency
            );
            return Err(SettlementError::CurrencyMismatch {
                id: payment.id,
                expected: payment.currency.clone(),
                actual: capture.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

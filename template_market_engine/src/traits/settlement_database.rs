use thiserror::Error;

use crate::db_types::{NewOrder, NewPayment, Order, Payment, PaymentState, UserId};

/// A single guarded payment transition. Optional fields are recorded only when the transition supplies them, so a
/// losing race can never scribble over the winner's audit trail.
#[derive(Debug, Clone, Default)]
pub struct SettlementUpdate {
    pub new_state: PaymentState,
    pub transaction_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub failure_reason: Option<String>,
    pub raw_webhook_payload: Option<String>,
}

impl SettlementUpdate {
    pub fn to_state(new_state: PaymentState) -> Self {
        Self { new_state, ..Default::default() }
    }

    pub fn with_transaction_id<S: Into<String>>(mut self, txid: S) -> Self {
        self.transaction_id = Some(txid.into());
        self
    }

    pub fn with_gateway_order_id<S: Into<String>>(mut self, id: S) -> Self {
        self.gateway_order_id = Some(id.into());
        self
    }

    pub fn with_failure_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    pub fn with_raw_payload<S: Into<String>>(mut self, payload: S) -> Self {
        self.raw_webhook_payload = Some(payload.into());
        self
    }
}

/// This trait defines the write-side behaviour for backends supporting the settlement engine.
///
/// Every status transition is a *conditional* update: the precondition and the write are one indivisible statement
/// against the store. The webhook path and the client-verification path race concurrently for the same payment, and
/// the store is the only arbiter; there are no in-process locks. A `None` return from a guarded transition means the
/// precondition no longer held (the record was already terminal), which callers treat as an idempotent no-op or a
/// conflict depending on the flow.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Persists a new order in `Pending`/`Created` state with its pricing and template snapshot frozen.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementError>;

    /// Whether the buyer already holds a successfully settled order for the template. Checked before order creation
    /// to enforce the one-successful-purchase invariant.
    async fn has_successful_purchase(&self, buyer_id: &UserId, template_id: i64) -> Result<bool, SettlementError>;

    /// Transitions an order owned by `buyer_id` with `Pending` payment status to `Cancelled`. Returns `None` if no
    /// such order exists. A settled, refunded or foreign order is never silently cancelled.
    async fn cancel_pending_order(&self, order_id: i64, buyer_id: &UserId) -> Result<Option<Order>, SettlementError>;

    /// Marks an order refunded (payment status `Failed`, order status `Refunded`) and stamps the refund record.
    /// Guarded: returns `None` if the order is already refunded.
    async fn refund_order(&self, order_id: i64, refund_transaction_id: &str) -> Result<Option<Order>, SettlementError>;

    /// Returns the order's existing `Created`-state payment, or inserts a new one. At most one `Created` payment
    /// exists per order at any time, so client checkout retries cannot mint duplicate gateway intents.
    async fn fetch_or_create_pending_payment(&self, payment: NewPayment) -> Result<Payment, SettlementError>;

    /// Records the remote intent id on a `Created` payment after the gateway accepted the checkout.
    async fn attach_gateway_order_id(&self, payment_id: i64, gateway_order_id: &str)
        -> Result<Payment, SettlementError>;

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, SettlementError>;

    async fn fetch_payment_by_gateway_order_id(&self, gateway_order_id: &str)
        -> Result<Option<Payment>, SettlementError>;

    /// The atomic conditional transition at the heart of settlement: moves the payment into the terminal state in
    /// `update` iff the persisted status is still non-terminal. Returns `None` when the payment was already terminal
    /// (the guard failed); the caller decides whether that is an idempotent success or a conflict.
    async fn finalize_payment(&self, payment_id: i64, update: SettlementUpdate)
        -> Result<Option<Payment>, SettlementError>;

    /// Guarded `Success` → `Refunded` transition; stamps `refunded_at`. Returns `None` if the payment is not
    /// currently `Success`, so a refund can never be applied (or re-stamped) twice.
    async fn refund_payment(&self, payment_id: i64) -> Result<Option<Payment>, SettlementError>;

    /// Cascades a settled payment onto its order: payment status `Success`, order status `Completed`, and records
    /// the settling payment and capture id on the order.
    async fn complete_order_for_payment(&self, payment: &Payment) -> Result<Order, SettlementError>;

    /// Cascades a failed or cancelled payment onto its order: payment status `Failed`, order status `Cancelled`.
    async fn fail_order_for_payment(&self, payment: &Payment) -> Result<Order, SettlementError>;

    /// Cascades a refunded payment onto its order: payment status `Refunded`, order status `Refunded`, with the
    /// refund stamp.
    async fn refund_order_for_payment(&self, payment: &Payment) -> Result<Order, SettlementError>;

    /// All payments recorded against an order, newest first. Used by the reconciliation path.
    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested template {0} does not exist")]
    TemplateNotFound(i64),
    #[error("Template {0} has already been purchased")]
    TemplateAlreadyPurchased(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Order {0} has already been processed")]
    OrderAlreadyProcessed(i64),
    #[error("Order {0} has already been refunded")]
    OrderAlreadyRefunded(i64),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("Payment {0} has already been finalized")]
    PaymentAlreadyFinalized(i64),
    #[error("Payment {0} has not settled successfully, so it cannot be refunded")]
    PaymentNotRefundable(i64),
    #[error("Amount mismatch on payment {id}: the gateway captured {actual} minor units but {expected} were expected")]
    AmountMismatch { id: i64, expected: i64, actual: i64 },
    #[error("Currency mismatch on payment {id}: the gateway captured {actual} but {expected} was expected")]
    CurrencyMismatch { id: i64, expected: String, actual: String },
    #[error("Payment gateway error: {0}")]
    GatewayError(String),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}

impl From<super::GatewayError> for SettlementError {
    fn from(e: super::GatewayError) -> Self {
        SettlementError::GatewayError(e.to_string())
    }
}

use crate::{
    db_types::{EarningsSummary, Order, Payment, UserId},
    traits::SettlementError,
};

/// Read-side queries over orders and payments.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError>;

    /// All orders placed by the buyer, newest first.
    async fn fetch_orders_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, SettlementError>;

    /// Successfully settled orders for the seller's templates, newest first.
    async fn fetch_orders_for_seller(&self, seller_id: &UserId) -> Result<Vec<Order>, SettlementError>;

    /// True iff the buyer holds a settled, completed order for the template. This is the single authorization gate
    /// for releasing the protected artifact URL and must be evaluated per request.
    async fn can_download(&self, buyer_id: &UserId, template_id: i64) -> Result<bool, SettlementError>;

    /// Aggregate sales figures over the seller's successfully settled orders.
    async fn seller_earnings(&self, seller_id: &UserId) -> Result<EarningsSummary, SettlementError>;

    async fn fetch_payments_for_user(&self, user_id: &UserId) -> Result<Vec<Payment>, SettlementError>;

    async fn fetch_all_payments(&self) -> Result<Vec<Payment>, SettlementError>;
}

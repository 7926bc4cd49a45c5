use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{EarningsSummary, NewOrder, Order, Payment, UserId},
    helpers::pricing::price_order,
    tme_api::order_objects::CreateOrderRequest,
    traits::{OrderManagement, SettlementDatabase, SettlementError, TemplateCatalog},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: purchase intent, cancellation, the download
/// authorization gate, administrative refunds and seller reporting.
pub struct OrderFlowApi<B> {
    db: B,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderFlowApi<B>
where B: SettlementDatabase + OrderManagement + TemplateCatalog
{
    /// Creates a new order for `buyer`.
    ///
    /// The template must exist, and the buyer may not already hold a successfully settled order for it: at most one
    /// order per (buyer, template) ever reaches a successful payment status. Pricing is computed once here and
    /// frozen on the order together with the template snapshot.
    pub async fn create_order(&self, buyer: &UserId, req: CreateOrderRequest) -> Result<Order, SettlementError> {
        let template = self
            .db
            .fetch_template(req.template_id)
            .await?
            .ok_or(SettlementError::TemplateNotFound(req.template_id))?;
        if self.db.has_successful_purchase(buyer, template.id).await? {
            debug!("📦️ {buyer} has already purchased template {}. Rejecting duplicate order.", template.id);
            return Err(SettlementError::TemplateAlreadyPurchased(template.id));
        }
        let pricing = price_order(&template, req.license_type);
        let order = NewOrder {
            buyer_id: buyer.clone(),
            seller_id: template.seller_id.clone(),
            template_id: template.id,
            template_title: template.title.clone(),
            template_slug: template.slug.clone(),
            template_version: template.version.clone(),
            price: pricing.price,
            currency: template.currency.clone(),
            platform_fee: pricing.platform_fee,
            seller_earning: pricing.seller_earning,
            license_type: req.license_type,
        };
        let order = self.db.insert_order(order).await?;
        info!(
            "📦️ Order #{} created: {buyer} buys template {} ({}) for {}",
            order.id, order.template_id, order.license_type, order.price
        );
        Ok(order)
    }

    /// Cancels an order owned by `buyer` that has not settled yet. Any other order (settled, refunded, or owned by
    /// someone else) reports [`SettlementError::OrderNotFound`] so the call leaks nothing about foreign orders.
    pub async fn cancel_pending_order(&self, order_id: i64, buyer: &UserId) -> Result<Order, SettlementError> {
        let cancelled = self.db.cancel_pending_order(order_id, buyer).await?;
        match cancelled {
            Some(order) => {
                info!("📦️ Order #{order_id} cancelled by {buyer}");
                Ok(order)
            },
            None => {
                debug!("📦️ No pending order #{order_id} owned by {buyer}; cancellation refused");
                Err(SettlementError::OrderNotFound(order_id))
            },
        }
    }

    /// The single authorization gate for releasing the protected artifact URL: true iff a settled, completed order
    /// links the buyer to the template. Never cache the result beyond the current request.
    pub async fn can_download(&self, buyer: &UserId, template_id: i64) -> Result<bool, SettlementError> {
        self.db.can_download(buyer, template_id).await
    }

    /// Administrative refund applied directly to an order (for disputes resolved outside the payment flow). The
    /// order's payment status becomes `Failed` and the order status `Refunded`, with a synthetic refund transaction
    /// id stamped on the record. Guarded: refunding an already-refunded order is rejected and nothing is re-stamped.
    pub async fn refund_order(&self, order_id: i64) -> Result<Order, SettlementError> {
        let refund_txid = format!("refund_{}", Utc::now().timestamp_millis());
        let refunded = self.db.refund_order(order_id, &refund_txid).await?;
        match refunded {
            Some(order) => {
                info!("📦️ Order #{order_id} refunded ({refund_txid})");
                Ok(order)
            },
            None => match self.db.fetch_order(order_id).await? {
                Some(_) => {
                    debug!("📦️ Order #{order_id} is already refunded; refusing to re-stamp");
                    Err(SettlementError::OrderAlreadyRefunded(order_id))
                },
                None => Err(SettlementError::OrderNotFound(order_id)),
            },
        }
    }

    /// Aggregate sales figures over the seller's successfully settled orders. Read-only and eventually consistent
    /// with respect to in-flight settlements.
    pub async fn seller_earnings(&self, seller: &UserId) -> Result<EarningsSummary, SettlementError> {
        self.db.seller_earnings(seller).await
    }

    pub async fn my_orders(&self, buyer: &UserId) -> Result<Vec<Order>, SettlementError> {
        self.db.fetch_orders_for_buyer(buyer).await
    }

    pub async fn seller_orders(&self, seller: &UserId) -> Result<Vec<Order>, SettlementError> {
        self.db.fetch_orders_for_seller(seller).await
    }

    /// Fetches a single order, visible only to its buyer or its seller. Anyone else sees
    /// [`SettlementError::OrderNotFound`].
    pub async fn order_by_id(&self, order_id: i64, requester: &UserId) -> Result<Order, SettlementError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(SettlementError::OrderNotFound(order_id))?;
        if &order.buyer_id != requester && &order.seller_id != requester {
            return Err(SettlementError::OrderNotFound(order_id));
        }
        Ok(order)
    }

    pub async fn my_payments(&self, user: &UserId) -> Result<Vec<Payment>, SettlementError> {
        self.db.fetch_payments_for_user(user).await
    }

    pub async fn all_payments(&self) -> Result<Vec<Payment>, SettlementError> {
        self.db.fetch_all_payments().await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

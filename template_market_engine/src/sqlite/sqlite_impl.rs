//! `SqliteDatabase` is the concrete storage backend for the template marketplace engine.
//!
//! It implements all the traits defined in the [`crate::traits`] module over a single SQLite connection pool.
use std::fmt::Debug;

use sqlx::SqlitePool;

use super::db::{new_pool, orders, payments, templates};
use crate::{
    db_types::{EarningsSummary, NewOrder, NewPayment, NewTemplate, Order, Payment, Template, UserId},
    traits::{OrderManagement, SettlementDatabase, SettlementError, SettlementUpdate, TemplateCatalog},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API with a connection pool of size `max_connections` attached to the given URL.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SettlementError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl TemplateCatalog for SqliteDatabase {
    async fn fetch_template(&self, template_id: i64) -> Result<Option<Template>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        templates::fetch_template(template_id, &mut conn).await
    }

    async fn upsert_template(&self, template: NewTemplate) -> Result<Template, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        templates::upsert_template(template, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_orders_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_buyer(buyer_id, &mut conn).await
    }

    async fn fetch_orders_for_seller(&self, seller_id: &UserId) -> Result<Vec<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_seller(seller_id, &mut conn).await
    }

    async fn can_download(&self, buyer_id: &UserId, template_id: i64) -> Result<bool, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::can_download(buyer_id, template_id, &mut conn).await
    }

    async fn seller_earnings(&self, seller_id: &UserId) -> Result<EarningsSummary, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::seller_earnings(seller_id, &mut conn).await
    }

    async fn fetch_payments_for_user(&self, user_id: &UserId) -> Result<Vec<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_for_user(user_id, &mut conn).await
    }

    async fn fetch_all_payments(&self) -> Result<Vec<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_all(&mut conn).await
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn has_successful_purchase(&self, buyer_id: &UserId, template_id: i64) -> Result<bool, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::has_successful_purchase(buyer_id, template_id, &mut conn).await
    }

    async fn cancel_pending_order(&self, order_id: i64, buyer_id: &UserId) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::cancel_pending_order(order_id, buyer_id, &mut conn).await
    }

    async fn refund_order(
        &self,
        order_id: i64,
        refund_transaction_id: &str,
    ) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::refund_order(order_id, refund_transaction_id, &mut conn).await
    }

    async fn fetch_or_create_pending_payment(&self, payment: NewPayment) -> Result<Payment, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_or_create_pending(payment, &mut conn).await
    }

    async fn attach_gateway_order_id(
        &self,
        payment_id: i64,
        gateway_order_id: &str,
    ) -> Result<Payment, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::attach_gateway_order_id(payment_id, gateway_order_id, &mut conn).await
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payment(payment_id, &mut conn).await
    }

    async fn fetch_payment_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_by_gateway_order_id(gateway_order_id, &mut conn).await
    }

    async fn finalize_payment(
        &self,
        payment_id: i64,
        update: SettlementUpdate,
    ) -> Result<Option<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::finalize(payment_id, update, &mut conn).await
    }

    async fn refund_payment(&self, payment_id: i64) -> Result<Option<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::refund(payment_id, &mut conn).await
    }

    async fn complete_order_for_payment(&self, payment: &Payment) -> Result<Order, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::complete_for_payment(payment, &mut conn).await
    }

    async fn fail_order_for_payment(&self, payment: &Payment) -> Result<Order, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::fail_for_payment(payment, &mut conn).await
    }

    async fn refund_order_for_payment(&self, payment: &Payment) -> Result<Order, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::refund_for_payment(payment, &mut conn).await
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_for_order(order_id, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}

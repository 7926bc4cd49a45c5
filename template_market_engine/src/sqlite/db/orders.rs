use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{EarningsSummary, NewOrder, Order, Payment, UserId},
    traits::SettlementError,
};

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SettlementError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                buyer_id,
                seller_id,
                template_id,
                template_title,
                template_slug,
                template_version,
                price,
                currency,
                platform_fee,
                seller_earning,
                license_type
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.template_id)
    .bind(order.template_title)
    .bind(order.template_slug)
    .bind(order.template_version)
    .bind(order.price)
    .bind(order.currency)
    .bind(order.platform_fee)
    .bind(order.seller_earning)
    .bind(order.license_type)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order inserted with id {}", order.id);
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, SettlementError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn has_successful_purchase(
    buyer_id: &UserId,
    template_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SettlementError> {
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM orders WHERE buyer_id = $1 AND template_id = $2 AND payment_status = 'Success' LIMIT 1",
    )
    .bind(buyer_id)
    .bind(template_id)
    .fetch_optional(conn)
    .await?;
    Ok(id.is_some())
}

/// Conditionally cancels the order: the guard (owned by buyer, still pending) and the write are one statement.
pub async fn cancel_pending_order(
    order_id: i64,
    buyer_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SettlementError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND buyer_id = $2 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(buyer_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Administrative refund stamp. Guarded against re-invocation on an already-refunded order.
pub async fn refund_order(
    order_id: i64,
    refund_transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SettlementError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Failed',
                status = 'Refunded',
                refunded_at = CURRENT_TIMESTAMP,
                refund_transaction_id = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status != 'Refunded'
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(refund_transaction_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn can_download(
    buyer_id: &UserId,
    template_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, SettlementError> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
            SELECT id FROM orders
            WHERE buyer_id = $1 AND template_id = $2 AND payment_status = 'Success' AND status = 'Completed'
            LIMIT 1
        "#,
    )
    .bind(buyer_id)
    .bind(template_id)
    .fetch_optional(conn)
    .await?;
    Ok(id.is_some())
}

pub async fn fetch_orders_for_buyer(
    buyer_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SettlementError> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE buyer_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(buyer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_orders_for_seller(
    seller_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SettlementError> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE seller_id = $1 AND payment_status = 'Success'
            ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(seller_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub async fn seller_earnings(
    seller_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<EarningsSummary, SettlementError> {
    let summary = sqlx::query_as(
        r#"
            SELECT
                COALESCE(SUM(price), 0) AS total_sales,
                COALESCE(SUM(seller_earning), 0) AS total_earnings,
                COUNT(*) AS total_orders
            FROM orders
            WHERE seller_id = $1 AND payment_status = 'Success'
        "#,
    )
    .bind(seller_id)
    .fetch_one(conn)
    .await?;
    Ok(summary)
}

/// The settlement cascade: a captured payment completes its order and records the settling payment on it.
pub(crate) async fn complete_for_payment(
    payment: &Payment,
    conn: &mut SqliteConnection,
) -> Result<Order, SettlementError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Success',
                status = 'Completed',
                payment_id = $2,
                transaction_id = $3,
                payment_method = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.id)
    .bind(payment.transaction_id.as_deref())
    .bind(payment.gateway.as_str())
    .fetch_optional(conn)
    .await?;
    order.ok_or(SettlementError::OrderNotFound(payment.order_id))
}

pub(crate) async fn fail_for_payment(
    payment: &Payment,
    conn: &mut SqliteConnection,
) -> Result<Order, SettlementError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Failed',
                status = 'Cancelled',
                payment_id = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.id)
    .fetch_optional(conn)
    .await?;
    order.ok_or(SettlementError::OrderNotFound(payment.order_id))
}

pub(crate) async fn refund_for_payment(
    payment: &Payment,
    conn: &mut SqliteConnection,
) -> Result<Order, SettlementError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'Refunded',
                status = 'Refunded',
                payment_id = $2,
                refunded_at = COALESCE($3, CURRENT_TIMESTAMP),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.id)
    .bind(payment.refunded_at)
    .fetch_optional(conn)
    .await?;
    order.ok_or(SettlementError::OrderNotFound(payment.order_id))
}

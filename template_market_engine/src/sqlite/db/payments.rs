use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, UserId},
    traits::{SettlementError, SettlementUpdate},
};

/// Returns the order's `Created`-state payment, inserting one if none exists. A partial unique index guarantees at
/// most one `Created` payment per order, so a lost insert race simply re-reads the winner's row.
pub async fn fetch_or_create_pending(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<Payment, SettlementError> {
    if let Some(existing) = fetch_created_for_order(payment.order_id, &mut *conn).await? {
        trace!("💳️ Reusing payment #{} for order #{}", existing.id, existing.order_id);
        return Ok(existing);
    }
    let order_id = payment.order_id;
    let inserted: Result<Payment, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, user_id, gateway, amount, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.user_id)
    .bind(payment.gateway)
    .bind(payment.amount)
    .bind(payment.currency)
    .fetch_one(&mut *conn)
    .await;
    match inserted {
        Ok(payment) => {
            debug!("💳️ Payment #{} created for order #{order_id}", payment.id);
            Ok(payment)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            // A concurrent checkout created the payment first; use theirs.
            fetch_created_for_order(order_id, conn)
                .await?
                .ok_or_else(|| SettlementError::DatabaseError(format!("Lost payment insert race for order {order_id}")))
        },
        Err(e) => Err(e.into()),
    }
}

async fn fetch_created_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SettlementError> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND status = 'Created' ORDER BY id LIMIT 1")
            .bind(order_id)
            .fetch_optional(conn)
            .await?;
    Ok(payment)
}

pub async fn attach_gateway_order_id(
    payment_id: i64,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Payment, SettlementError> {
    let payment: Option<Payment> = sqlx::query_as(
        "UPDATE payments SET gateway_order_id = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *",
    )
    .bind(payment_id)
    .bind(gateway_order_id)
    .fetch_optional(conn)
    .await?;
    payment.ok_or(SettlementError::PaymentNotFound(payment_id))
}

pub async fn fetch_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, SettlementError> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(payment_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_by_gateway_order_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SettlementError> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// The atomic conditional terminal transition. The guard (`status` not already terminal) and the write are a single
/// UPDATE, which is what lets concurrent webhook and client-verify deliveries race safely: exactly one of them
/// observes a row here, every other caller gets `None`.
pub async fn finalize(
    payment_id: i64,
    update: SettlementUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, SettlementError> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = $2,
                gateway_order_id = COALESCE($3, gateway_order_id),
                transaction_id = COALESCE($4, transaction_id),
                failure_reason = COALESCE($5, failure_reason),
                raw_webhook_payload = COALESCE($6, raw_webhook_payload),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status NOT IN ('Success', 'Failed', 'Refunded', 'Cancelled')
            RETURNING *;
        "#,
    )
    .bind(payment_id)
    .bind(update.new_state)
    .bind(update.gateway_order_id)
    .bind(update.transaction_id)
    .bind(update.failure_reason)
    .bind(update.raw_webhook_payload)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// `Success` → `Refunded`, guarded so `refunded_at` can only ever be stamped once.
pub async fn refund(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, SettlementError> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = 'Refunded',
                refunded_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'Success'
            RETURNING *;
        "#,
    )
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Payment>, SettlementError> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Payment>, SettlementError> {
    let payments =
        sqlx::query_as("SELECT * FROM payments ORDER BY created_at DESC, id DESC").fetch_all(conn).await?;
    Ok(payments)
}

pub async fn fetch_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payment>, SettlementError> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

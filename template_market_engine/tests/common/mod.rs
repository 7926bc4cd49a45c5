//! Shared scaffolding for the engine integration tests: a fresh migrated database per test, a seeded template, and
//! shorthand for driving a purchase to a given point in its lifecycle.
#![allow(dead_code)]

use template_market_engine::{
    db_types::{LicenseType, NewTemplate, Order, Payment, Template, UserId},
    order_objects::CreateOrderRequest,
    payment_objects::{CheckoutSummary, PaymentCapture},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        stub_gateway::StubGateway,
    },
    OrderFlowApi,
    SettlementApi,
    SqliteDatabase,
    TemplateCatalog,
};

pub async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub fn order_api(db: &SqliteDatabase) -> OrderFlowApi<SqliteDatabase> {
    OrderFlowApi::new(db.clone())
}

pub fn settlement_api(db: &SqliteDatabase, gateway: &StubGateway) -> SettlementApi<SqliteDatabase, StubGateway> {
    SettlementApi::new(db.clone(), gateway.clone())
}

pub async fn seed_template(db: &SqliteDatabase, personal: i64, commercial: i64) -> Template {
    seed_template_with_slug(db, "portfolio-starter", personal, commercial).await
}

pub async fn seed_template_with_slug(
    db: &SqliteDatabase,
    slug: &str,
    personal: i64,
    commercial: i64,
) -> Template {
    db.upsert_template(NewTemplate {
        seller_id: UserId::from("seller-1"),
        title: "Portfolio starter".to_string(),
        slug: slug.to_string(),
        version: "1.0.0".to_string(),
        personal_price: personal.into(),
        commercial_price: commercial.into(),
    })
    .await
    .expect("Error seeding template")
}

pub fn buyer() -> UserId {
    UserId::from("buyer-1")
}

pub async fn place_order(db: &SqliteDatabase, buyer: &UserId, template: &Template, license: LicenseType) -> Order {
    order_api(db)
        .create_order(buyer, CreateOrderRequest { template_id: template.id, license_type: license })
        .await
        .expect("Error creating order")
}

pub async fn open_checkout(
    db: &SqliteDatabase,
    gateway: &StubGateway,
    order: &Order,
    buyer: &UserId,
) -> CheckoutSummary {
    settlement_api(db, gateway).create_checkout(order.id, buyer).await.expect("Error creating checkout")
}

/// A well-formed capture event matching the given checkout.
pub fn capture_for(checkout: &CheckoutSummary, txid: &str) -> PaymentCapture {
    PaymentCapture {
        gateway_order_id: checkout.gateway_order_id.clone(),
        transaction_id: txid.to_string(),
        amount_minor: checkout.amount.minor_units(),
        currency: checkout.currency.clone(),
        raw_payload: serde_json::json!({
            "event": "payment.captured",
            "payload": { "payment": { "entity": {
                "id": txid,
                "order_id": checkout.gateway_order_id,
                "amount": checkout.amount.minor_units(),
                "currency": checkout.currency,
            }}}
        })
        .to_string(),
    }
}

/// Drives a purchase all the way to a settled, completed order. Returns the settled payment.
pub async fn settle_purchase(
    db: &SqliteDatabase,
    gateway: &StubGateway,
    order: &Order,
    buyer: &UserId,
    txid: &str,
) -> Payment {
    let checkout = open_checkout(db, gateway, order, buyer).await;
    let api = settlement_api(db, gateway);
    match api.payment_captured(capture_for(&checkout, txid)).await.expect("Error settling payment") {
        template_market_engine::payment_objects::WebhookOutcome::Settled(p) => p,
        other => panic!("Expected settlement, got {other:?}"),
    }
}

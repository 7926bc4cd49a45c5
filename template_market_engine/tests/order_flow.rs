mod common;

use common::*;
use template_market_engine::{
    db_types::{LicenseType, NewTemplate, OrderStatusType, PaymentStatus, UserId},
    order_objects::CreateOrderRequest,
    test_utils::stub_gateway::StubGateway,
    OrderManagement,
    SettlementError,
    TemplateCatalog,
};
use tmg_common::Money;

#[tokio::test]
async fn create_order_freezes_pricing_and_snapshot() {
    let db = new_db().await;
    let template = seed_template(&db, 500, 1000).await;
    let buyer = buyer();

    let order = place_order(&db, &buyer, &template, LicenseType::Commercial).await;
    assert_eq!(order.price, Money::from(1000));
    assert_eq!(order.platform_fee, Money::from(200));
    assert_eq!(order.seller_earning, Money::from(800));
    assert_eq!(order.platform_fee + order.seller_earning, order.price);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatusType::Created);
    assert_eq!(order.template_title, "Portfolio starter");
    assert_eq!(order.template_version, "1.0.0");

    // A later catalog edit must not rewrite the order's snapshot or pricing.
    let updated = NewTemplate {
        seller_id: template.seller_id.clone(),
        title: "Portfolio starter PRO".to_string(),
        slug: template.slug.clone(),
        version: "2.0.0".to_string(),
        personal_price: Money::from(900),
        commercial_price: Money::from(9000),
    };
    db.upsert_template(updated).await.unwrap();
    let unchanged = db.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(unchanged.template_title, "Portfolio starter");
    assert_eq!(unchanged.price, Money::from(1000));
}

#[tokio::test]
async fn personal_license_uses_personal_tier() {
    let db = new_db().await;
    let template = seed_template(&db, 500, 1000).await;
    let order = place_order(&db, &buyer(), &template, LicenseType::Personal).await;
    assert_eq!(order.price, Money::from(500));
    assert_eq!(order.platform_fee, Money::from(100));
    assert_eq!(order.seller_earning, Money::from(400));
}

#[tokio::test]
async fn unknown_template_is_rejected() {
    let db = new_db().await;
    let api = order_api(&db);
    let err = api
        .create_order(&buyer(), CreateOrderRequest { template_id: 999, license_type: LicenseType::Personal })
        .await
        .unwrap_err();
    assert!(matches!(err, SettlementError::TemplateNotFound(999)));
}

#[tokio::test]
async fn second_successful_purchase_is_rejected() {
    let db = new_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db, 500, 1000).await;
    let buyer = buyer();

    let order = place_order(&db, &buyer, &template, LicenseType::Personal).await;
    settle_purchase(&db, &gateway, &order, &buyer, "pay_001").await;

    let err = order_api(&db)
        .create_order(&buyer, CreateOrderRequest { template_id: template.id, license_type: LicenseType::Commercial })
        .await
        .unwrap_err();
    assert!(matches!(err, SettlementError::TemplateAlreadyPurchased(id) if id == template.id));

    // A different buyer is unaffected.
    let other = UserId::from("buyer-2");
    let order = place_order(&db, &other, &template, LicenseType::Personal).await;
    assert_eq!(order.buyer_id, other);
}

#[tokio::test]
async fn pending_order_can_be_cancelled_by_its_buyer_only() {
    let db = new_db().await;
    let template = seed_template(&db, 500, 1000).await;
    let buyer = buyer();
    let order = place_order(&db, &buyer, &template, LicenseType::Personal).await;

    let api = order_api(&db);
    let stranger = UserId::from("someone-else");
    let err = api.cancel_pending_order(order.id, &stranger).await.unwrap_err();
    assert!(matches!(err, SettlementError::OrderNotFound(_)));

    let cancelled = api.cancel_pending_order(order.id, &buyer).await.unwrap();
    assert_eq!(cancelled.status, OrderStatusType::Cancelled);
    assert_eq!(cancelled.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn settled_order_cannot_be_cancelled() {
    let db = new_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db, 500, 1000).await;
    let buyer = buyer();
    let order = place_order(&db, &buyer, &template, LicenseType::Personal).await;
    settle_purchase(&db, &gateway, &order, &buyer, "pay_002").await;

    let err = order_api(&db).cancel_pending_order(order.id, &buyer).await.unwrap_err();
    assert!(matches!(err, SettlementError::OrderNotFound(id) if id == order.id));
    let order = db.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Completed);
}

#[tokio::test]
async fn download_gate_requires_settled_and_completed() {
    let db = new_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db, 500, 1000).await;
    let buyer = buyer();
    let api = order_api(&db);

    assert!(!api.can_download(&buyer, template.id).await.unwrap());

    let order = place_order(&db, &buyer, &template, LicenseType::Personal).await;
    assert!(!api.can_download(&buyer, template.id).await.unwrap(), "pending order must not grant downloads");

    let payment = settle_purchase(&db, &gateway, &order, &buyer, "pay_003").await;
    assert!(api.can_download(&buyer, template.id).await.unwrap());
    assert!(!api.can_download(&UserId::from("buyer-2"), template.id).await.unwrap());

    // A refund revokes the grant.
    settlement_api(&db, &gateway).refund_payment(payment.id).await.unwrap();
    assert!(!api.can_download(&buyer, template.id).await.unwrap());
}

#[tokio::test]
async fn administrative_order_refund_is_guarded() {
    let db = new_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db, 500, 1000).await;
    let buyer = buyer();
    let order = place_order(&db, &buyer, &template, LicenseType::Personal).await;
    settle_purchase(&db, &gateway, &order, &buyer, "pay_004").await;

    let api = order_api(&db);
    let refunded = api.refund_order(order.id).await.unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Failed);
    assert_eq!(refunded.status, OrderStatusType::Refunded);
    assert!(refunded.refunded_at.is_some());
    let stamp = refunded.refund_transaction_id.clone().unwrap();
    assert!(stamp.starts_with("refund_"));

    // Refunding again is rejected and nothing is re-stamped.
    let err = api.refund_order(order.id).await.unwrap_err();
    assert!(matches!(err, SettlementError::OrderAlreadyRefunded(id) if id == order.id));
    let order = db.fetch_order(order.id).await.unwrap().unwrap();
    assert_eq!(order.refund_transaction_id.unwrap(), stamp);

    let err = api.refund_order(999).await.unwrap_err();
    assert!(matches!(err, SettlementError::OrderNotFound(999)));
}

#[tokio::test]
async fn seller_earnings_cover_only_settled_orders() {
    let db = new_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db, 500, 1000).await;
    let seller = template.seller_id.clone();

    let first = UserId::from("buyer-1");
    let order = place_order(&db, &first, &template, LicenseType::Commercial).await;
    settle_purchase(&db, &gateway, &order, &first, "pay_005").await;

    let second = UserId::from("buyer-2");
    let order = place_order(&db, &second, &template, LicenseType::Personal).await;
    settle_purchase(&db, &gateway, &order, &second, "pay_006").await;

    // A third order stays pending and must not count.
    let third = UserId::from("buyer-3");
    place_order(&db, &third, &template, LicenseType::Commercial).await;

    let api = order_api(&db);
    let summary = api.seller_earnings(&seller).await.unwrap();
    assert_eq!(summary.total_orders, 2);
    assert_eq!(summary.total_sales, Money::from(1500));
    assert_eq!(summary.total_earnings, Money::from(1200));

    let empty = api.seller_earnings(&UserId::from("seller-without-sales")).await.unwrap();
    assert_eq!(empty.total_orders, 0);
    assert_eq!(empty.total_sales, Money::from(0));
    assert_eq!(empty.total_earnings, Money::from(0));
}

#[tokio::test]
async fn orders_are_visible_to_buyer_and_seller_only() {
    let db = new_db().await;
    let template = seed_template(&db, 500, 1000).await;
    let buyer = buyer();
    let order = place_order(&db, &buyer, &template, LicenseType::Personal).await;

    let api = order_api(&db);
    assert_eq!(api.order_by_id(order.id, &buyer).await.unwrap().id, order.id);
    assert_eq!(api.order_by_id(order.id, &template.seller_id).await.unwrap().id, order.id);
    let err = api.order_by_id(order.id, &UserId::from("stranger")).await.unwrap_err();
    assert!(matches!(err, SettlementError::OrderNotFound(_)));

    let mine = api.my_orders(&buyer).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(api.seller_orders(&template.seller_id).await.unwrap().is_empty(), "unsettled orders are not sales");
}

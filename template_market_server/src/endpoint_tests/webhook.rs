use actix_web::{http::StatusCode, test, test::TestRequest};
use razorpay_tools::helpers::calculate_hmac_hex;
use serde_json::json;
use template_market_engine::{
    db_types::{LicenseType, PaymentState, UserId},
    order_objects::CreateOrderRequest,
    payment_objects::CheckoutSummary,
    test_utils::stub_gateway::StubGateway,
    OrderFlowApi,
    SettlementApi,
    SettlementDatabase,
    SqliteDatabase,
};

use super::helpers::{call_status, new_test_db, seed_template, test_app, WEBHOOK_SECRET};
use crate::integrations::razorpay::WEBHOOK_SIGNATURE_HEADER;

async fn pending_checkout(db: &SqliteDatabase, gateway: &StubGateway) -> CheckoutSummary {
    let template = seed_template(db).await;
    let buyer = UserId::from("buyer-1");
    let order = OrderFlowApi::new(db.clone())
        .create_order(&buyer, CreateOrderRequest { template_id: template.id, license_type: LicenseType::Commercial })
        .await
        .expect("Error creating order");
    SettlementApi::new(db.clone(), gateway.clone())
        .create_checkout(order.id, &buyer)
        .await
        .expect("Error creating checkout")
}

fn capture_body(checkout: &CheckoutSummary) -> String {
    json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_webhook_1",
            "order_id": checkout.gateway_order_id,
            "amount": checkout.amount.minor_units(),
            "currency": checkout.currency,
        }}}
    })
    .to_string()
}

fn signed_webhook(body: String) -> TestRequest {
    let signature = calculate_hmac_hex(WEBHOOK_SECRET, body.as_bytes());
    TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .insert_header(("content-type", "application/json"))
        .set_payload(body)
}

#[actix_web::test]
async fn valid_capture_settles_the_payment() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let checkout = pending_checkout(&db, &gateway).await;

    let app = test::init_service(test_app!(&db, &gateway)).await;
    let res = test::call_service(&app, signed_webhook(capture_body(&checkout)).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let payment = db.fetch_payment(checkout.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentState::Success);
    assert_eq!(payment.transaction_id.as_deref(), Some("pay_webhook_1"));
}

#[actix_web::test]
async fn missing_or_invalid_signature_is_rejected_before_the_handler() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let checkout = pending_checkout(&db, &gateway).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let body = capture_body(&checkout);
    let unsigned = TestRequest::post().uri("/gateway/webhook").set_payload(body.clone()).to_request();
    assert_eq!(call_status(&app, unsigned).await, StatusCode::UNAUTHORIZED);

    let forged = TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, calculate_hmac_hex("wrong-secret", body.as_bytes())))
        .set_payload(body.clone())
        .to_request();
    assert_eq!(call_status(&app, forged).await, StatusCode::UNAUTHORIZED);

    let truncated = TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, "deadbeef"))
        .set_payload(body)
        .to_request();
    assert_eq!(call_status(&app, truncated).await, StatusCode::UNAUTHORIZED);

    // The handler never ran: the payment is untouched.
    let payment = db.fetch_payment(checkout.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentState::Created);
}

#[actix_web::test]
async fn irrelevant_events_are_acknowledged() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let checkout = pending_checkout(&db, &gateway).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let body = json!({ "event": "payment.authorized", "payload": {} }).to_string();
    let res = test::call_service(&app, signed_webhook(body).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let payment = db.fetch_payment(checkout.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentState::Created);
}

#[actix_web::test]
async fn unknown_remote_order_is_acknowledged() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let body = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_x", "order_id": "order_unknown", "amount": 100, "currency": "INR"
        }}}
    })
    .to_string();
    let res = test::call_service(&app, signed_webhook(body).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn duplicate_deliveries_are_acknowledged() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let checkout = pending_checkout(&db, &gateway).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let res = test::call_service(&app, signed_webhook(capture_body(&checkout)).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = test::call_service(&app, signed_webhook(capture_body(&checkout)).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK, "a duplicate delivery must not provoke gateway retries");
}

#[actix_web::test]
async fn amount_mismatch_is_a_client_error() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let checkout = pending_checkout(&db, &gateway).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let body = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_short",
            "order_id": checkout.gateway_order_id,
            "amount": checkout.amount.minor_units() - 100,
            "currency": checkout.currency,
        }}}
    })
    .to_string();
    assert_eq!(call_status(&app, signed_webhook(body).to_request()).await, StatusCode::BAD_REQUEST);

    let payment = db.fetch_payment(checkout.payment_id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentState::Created);
}

#[actix_web::test]
async fn unparseable_payloads_are_a_client_error() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let app = test::init_service(test_app!(&db, &gateway)).await;

    assert_eq!(
        call_status(&app, signed_webhook("not json at all".to_string()).to_request()).await,
        StatusCode::BAD_REQUEST
    );
}

use actix_web::{http::StatusCode, test, test::TestRequest};
use razorpay_tools::helpers::calculate_hmac_hex;
use serde_json::json;
use template_market_engine::test_utils::stub_gateway::StubGateway;

use super::helpers::{call_status, new_test_db, seed_template, test_app, WEBHOOK_SECRET};
use crate::{auth::{USER_ID_HEADER, USER_ROLES_HEADER}, integrations::razorpay::WEBHOOK_SIGNATURE_HEADER};

fn as_user(req: TestRequest, user: &str) -> TestRequest {
    req.insert_header((USER_ID_HEADER, user))
}

fn as_admin(req: TestRequest) -> TestRequest {
    req.insert_header((USER_ID_HEADER, "ops-1")).insert_header((USER_ROLES_HEADER, "user, admin"))
}

#[actix_web::test]
async fn anonymous_requests_are_unauthorized() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let res = test::call_service(&app, TestRequest::get().uri("/api/orders").to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/orders")
            .set_json(json!({"template_id": 1, "license_type": "personal"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn health_needs_no_principal() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let app = test::init_service(test_app!(&db, &gateway)).await;
    let res = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn purchase_flow_end_to_end() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    // Create the order.
    let req = as_user(TestRequest::post().uri("/api/orders"), "buyer-1")
        .set_json(json!({"template_id": template.id, "license_type": "commercial"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(order["price"], 1000);
    assert_eq!(order["platform_fee"], 200);
    assert_eq!(order["seller_earning"], 800);
    let order_id = order["id"].as_i64().unwrap();

    // No download grant while the order is pending.
    let req = as_user(TestRequest::get().uri(&format!("/api/templates/{}/can-download", template.id)), "buyer-1")
        .to_request();
    let res = test::call_service(&app, req).await;
    let gate: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(gate["can_download"], false);

    // Open checkout.
    let req = as_user(TestRequest::post().uri("/api/checkout"), "buyer-1")
        .set_json(json!({"order_id": order_id}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let checkout: serde_json::Value = test::read_body_json(res).await;
    let gateway_order_id = checkout["gateway_order_id"].as_str().unwrap().to_string();
    assert_eq!(checkout["amount"], 1000);

    // The gateway confirms via webhook.
    let body = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": {
            "id": "pay_e2e", "order_id": gateway_order_id, "amount": 100_000, "currency": "INR"
        }}}
    })
    .to_string();
    let signature = calculate_hmac_hex(WEBHOOK_SECRET, body.as_bytes());
    let req = TestRequest::post()
        .uri("/gateway/webhook")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    // The grant is now active, for the buyer only.
    let req = as_user(TestRequest::get().uri(&format!("/api/templates/{}/can-download", template.id)), "buyer-1")
        .to_request();
    let gate: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(gate["can_download"], true);
    let req = as_user(TestRequest::get().uri(&format!("/api/templates/{}/can-download", template.id)), "buyer-2")
        .to_request();
    let gate: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(gate["can_download"], false);

    // The seller sees the sale.
    let req = as_user(TestRequest::get().uri("/api/seller/earnings"), "seller-1").to_request();
    let earnings: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(earnings["total_orders"], 1);
    assert_eq!(earnings["total_sales"], 1000);
    assert_eq!(earnings["total_earnings"], 800);
}

#[actix_web::test]
async fn buying_twice_conflicts() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let create = || {
        as_user(TestRequest::post().uri("/api/orders"), "buyer-1")
            .set_json(json!({"template_id": template.id, "license_type": "personal"}))
            .to_request()
    };
    let res = test::call_service(&app, create()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = test::read_body_json(res).await;
    let order_id = order["id"].as_i64().unwrap();

    // Settle via the client-verification path.
    let res = test::call_service(
        &app,
        as_user(TestRequest::post().uri("/api/checkout"), "buyer-1")
            .set_json(json!({"order_id": order_id}))
            .to_request(),
    )
    .await;
    let checkout: serde_json::Value = test::read_body_json(res).await;
    let res = test::call_service(
        &app,
        as_user(TestRequest::post().uri("/api/payments/verify"), "buyer-1")
            .set_json(json!({
                "payment_id": checkout["payment_id"],
                "gateway_order_id": checkout["gateway_order_id"],
                "transaction_id": "pay_verify_1",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(&app, create()).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn admin_routes_require_the_admin_role() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let res = test::call_service(
        &app,
        as_user(TestRequest::post().uri("/api/orders"), "buyer-1")
            .set_json(json!({"template_id": template.id, "license_type": "personal"}))
            .to_request(),
    )
    .await;
    let order: serde_json::Value = test::read_body_json(res).await;
    let order_id = order["id"].as_i64().unwrap();

    // A plain user may not refund.
    let req = as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/refund")), "buyer-1").to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::FORBIDDEN);

    // Nor may an anonymous caller.
    let req = TestRequest::post().uri(&format!("/api/orders/{order_id}/refund")).to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // An admin may.
    let res = test::call_service(
        &app,
        as_admin(TestRequest::post().uri(&format!("/api/orders/{order_id}/refund"))).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Refunding the same order again is a conflict (uniform guard policy).
    let res = test::call_service(
        &app,
        as_admin(TestRequest::post().uri(&format!("/api/orders/{order_id}/refund"))).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn cancelling_someone_elses_order_is_not_found() {
    let db = new_test_db().await;
    let gateway = StubGateway::new();
    let template = seed_template(&db).await;
    let app = test::init_service(test_app!(&db, &gateway)).await;

    let res = test::call_service(
        &app,
        as_user(TestRequest::post().uri("/api/orders"), "buyer-1")
            .set_json(json!({"template_id": template.id, "license_type": "personal"}))
            .to_request(),
    )
    .await;
    let order: serde_json::Value = test::read_body_json(res).await;
    let order_id = order["id"].as_i64().unwrap();

    let res = test::call_service(
        &app,
        as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")), "buyer-2").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        as_user(TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")), "buyer-1").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

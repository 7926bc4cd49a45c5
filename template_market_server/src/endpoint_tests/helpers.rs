//! Scaffolding for the endpoint tests: a migrated per-test database, a seeded template, and an app instance wired
//! exactly like the production server but with the stub gateway.

use actix_web::{
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    HttpResponse,
};
use template_market_engine::{
    db_types::{NewTemplate, Template, UserId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
    TemplateCatalog,
};

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Resolves a request to its response status. Unlike `test::call_service`, this also captures rejections raised by
/// middleware (HMAC, ACL), which surface as service-level errors rather than responses.
pub async fn call_status<S, B>(app: &S, req: actix_http::Request) -> StatusCode
where S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error> {
    match test::try_call_service(app, req).await {
        Ok(res) => res.status(),
        Err(e) => HttpResponse::from_error(e).status(),
    }
}

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn seed_template(db: &SqliteDatabase) -> Template {
    db.upsert_template(NewTemplate {
        seller_id: UserId::from("seller-1"),
        title: "Portfolio starter".to_string(),
        slug: "portfolio-starter".to_string(),
        version: "1.0.0".to_string(),
        personal_price: 500.into(),
        commercial_price: 1000.into(),
    })
    .await
    .expect("Error seeding template")
}

/// Builds an `App` wired like [`crate::server::create_server_instance`], against the given database and the stub
/// gateway, with webhook HMAC checks enabled under [`WEBHOOK_SECRET`].
macro_rules! test_app {
    ($db:expr, $gateway:expr) => {{
        use template_market_engine::{test_utils::stub_gateway::StubGateway, SqliteDatabase};
        let orders_api = template_market_engine::OrderFlowApi::new($db.clone());
        let settlement_api = template_market_engine::SettlementApi::new($db.clone(), $gateway.clone());
        let hmac = $crate::middleware::HmacMiddlewareFactory::new(
            $crate::integrations::razorpay::WEBHOOK_SIGNATURE_HEADER,
            tmg_common::Secret::new($crate::endpoint_tests::helpers::WEBHOOK_SECRET.to_string()),
            true,
        );
        actix_web::App::new()
            .app_data(actix_web::web::Data::new(orders_api))
            .app_data(actix_web::web::Data::new(settlement_api))
            .app_data(actix_web::web::Data::new($crate::config::ProxyConfig::default()))
            .service($crate::routes::health)
            .service(
                actix_web::web::scope("/api")
                    .service($crate::routes::CreateOrderRoute::<SqliteDatabase>::new())
                    .service($crate::routes::MyOrdersRoute::<SqliteDatabase>::new())
                    .service($crate::routes::OrderByIdRoute::<SqliteDatabase>::new())
                    .service($crate::routes::CancelOrderRoute::<SqliteDatabase>::new())
                    .service($crate::routes::RefundOrderRoute::<SqliteDatabase>::new())
                    .service($crate::routes::CanDownloadRoute::<SqliteDatabase>::new())
                    .service($crate::routes::SellerOrdersRoute::<SqliteDatabase>::new())
                    .service($crate::routes::SellerEarningsRoute::<SqliteDatabase>::new())
                    .service($crate::routes::CheckoutRoute::<SqliteDatabase, StubGateway>::new())
                    .service($crate::routes::VerifyPaymentRoute::<SqliteDatabase, StubGateway>::new())
                    .service($crate::routes::FailPaymentRoute::<SqliteDatabase, StubGateway>::new())
                    .service($crate::routes::CancelPaymentRoute::<SqliteDatabase, StubGateway>::new())
                    .service($crate::routes::RefundPaymentRoute::<SqliteDatabase, StubGateway>::new())
                    .service($crate::routes::ReconcileOrderRoute::<SqliteDatabase, StubGateway>::new())
                    .service($crate::routes::MyPaymentsRoute::<SqliteDatabase>::new())
                    .service($crate::routes::AllPaymentsRoute::<SqliteDatabase>::new()),
            )
            .service(
                actix_web::web::scope("/gateway")
                    .wrap(hmac)
                    .service($crate::webhook_routes::GatewayWebhookRoute::<SqliteDatabase, StubGateway>::new()),
            )
    }};
}
pub(crate) use test_app;

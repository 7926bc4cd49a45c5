use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use template_market_engine::{OrderFlowApi, SettlementApi, SqliteDatabase};

use crate::{
    config::{ProxyConfig, ServerConfig},
    errors::ServerError,
    integrations::razorpay::{RazorpayGateway, WEBHOOK_SIGNATURE_HEADER},
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        AllPaymentsRoute,
        CanDownloadRoute,
        CancelOrderRoute,
        CancelPaymentRoute,
        CheckoutRoute,
        CreateOrderRoute,
        FailPaymentRoute,
        MyOrdersRoute,
        MyPaymentsRoute,
        OrderByIdRoute,
        ReconcileOrderRoute,
        RefundOrderRoute,
        RefundPaymentRoute,
        SellerEarningsRoute,
        SellerOrdersRoute,
        VerifyPaymentRoute,
    },
    webhook_routes::GatewayWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = razorpay_tools::RazorpayApi::new(config.gateway_config.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, RazorpayGateway::new(gateway))?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
) -> Result<actix_web::dev::Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let settlement_api = SettlementApi::new(db.clone(), gateway.clone());
        let proxy_config = ProxyConfig::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tmg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(proxy_config));
        // Routes that require an authenticated principal
        let api_scope = web::scope("/api")
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(RefundOrderRoute::<SqliteDatabase>::new())
            .service(CanDownloadRoute::<SqliteDatabase>::new())
            .service(SellerOrdersRoute::<SqliteDatabase>::new())
            .service(SellerEarningsRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(FailPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(CancelPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(RefundPaymentRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(ReconcileOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(MyPaymentsRoute::<SqliteDatabase>::new())
            .service(AllPaymentsRoute::<SqliteDatabase>::new());
        // The gateway's webhook deliveries authenticate via HMAC over the raw body, not via the identity service.
        let hmac = HmacMiddlewareFactory::new(
            WEBHOOK_SIGNATURE_HEADER,
            config.gateway_config.webhook_secret.clone(),
            config.hmac_checks,
        );
        let gateway_scope =
            web::scope("/gateway").wrap(hmac).service(GatewayWebhookRoute::<SqliteDatabase, RazorpayGateway>::new());
        app.service(health).service(api_scope).service(gateway_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

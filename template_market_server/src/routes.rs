//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) must be expressed as futures or asynchronous functions, which get executed concurrently
//! by the worker threads.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use template_market_engine::{
    db_types::Role,
    order_objects::CreateOrderRequest,
    payment_objects::VerifyPaymentRequest,
    OrderFlowApi,
    OrderManagement,
    PaymentGateway,
    SettlementApi,
    SettlementDatabase,
    TemplateCatalog,
};

use crate::{
    auth::AuthenticatedUser,
    data_objects::{CanDownloadResult, CheckoutParams, FailPaymentParams},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
//
// `impl` routes take a single backend type parameter carrying the listed trait bounds; `settles` routes additionally
// take the payment-gateway type parameter. Append `requires [...]` to wrap the route in the role ACL.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal settles $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B, G>(core::marker::PhantomData<fn() -> (B, G)>);}
        paste::paste! { impl<B, G> [<$name:camel Route>]<B, G> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<B, G> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B, G>
        where
            B: $($bounds +)+ 'static,
            G: template_market_engine::PaymentGateway + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B, G>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal settles $($bounds:ty),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<B, G>(core::marker::PhantomData<fn() -> (B, G)>);}
        paste::paste! { impl<B, G> [<$name:camel Route>]<B, G> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<B, G> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B, G>
        where
            B: $($bounds +)+ 'static,
            G: template_market_engine::PaymentGateway + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B, G>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

route!(create_order => Post "/orders" impl SettlementDatabase, OrderManagement, TemplateCatalog);
/// Creates a new order for the authenticated buyer. The pricing breakdown and template snapshot are frozen on the
/// order at this point; settlement happens separately via checkout.
pub async fn create_order<B>(
    user: AuthenticatedUser,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    let req = body.into_inner();
    debug!("💻️ POST order for template {} by {}", req.template_id, user.id);
    let order = api.create_order(&user.id, req).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl SettlementDatabase, OrderManagement, TemplateCatalog);
pub async fn my_orders<B>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    debug!("💻️ GET my orders for {}", user.id);
    let orders = api.my_orders(&user.id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl SettlementDatabase, OrderManagement, TemplateCatalog);
/// Fetches a single order. Only the order's buyer or seller can see it; anyone else gets a 404 rather than a 403,
/// so the route does not leak which order ids exist.
pub async fn order_by_id<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for {}", user.id);
    let order = api.order_by_id(order_id, &user.id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl SettlementDatabase, OrderManagement, TemplateCatalog);
pub async fn cancel_order<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    let order_id = path.into_inner();
    debug!("💻️ POST cancel order {order_id} for {}", user.id);
    let order = api.cancel_pending_order(order_id, &user.id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(refund_order => Post "/orders/{id}/refund" impl SettlementDatabase, OrderManagement, TemplateCatalog where requires [Role::Admin]);
pub async fn refund_order<B>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    let order_id = path.into_inner();
    debug!("💻️ POST refund order {order_id}");
    let order = api.refund_order(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(can_download => Get "/templates/{id}/can-download" impl SettlementDatabase, OrderManagement, TemplateCatalog);
/// The download authorization gate. Evaluated against the ledger on every call; responses must not be cached.
pub async fn can_download<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    let template_id = path.into_inner();
    trace!("💻️ GET can-download template {template_id} for {}", user.id);
    let can_download = api.can_download(&user.id, template_id).await?;
    Ok(HttpResponse::Ok().json(CanDownloadResult { can_download }))
}

route!(seller_orders => Get "/seller/orders" impl SettlementDatabase, OrderManagement, TemplateCatalog);
pub async fn seller_orders<B>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    debug!("💻️ GET sold orders for {}", user.id);
    let orders = api.seller_orders(&user.id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(seller_earnings => Get "/seller/earnings" impl SettlementDatabase, OrderManagement, TemplateCatalog);
pub async fn seller_earnings<B>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    debug!("💻️ GET earnings for {}", user.id);
    let summary = api.seller_earnings(&user.id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Payments  ----------------------------------------------------

route!(checkout => Post "/checkout" settles SettlementDatabase, OrderManagement);
/// Opens (or resumes) checkout for a pending order, creating the remote gateway intent if one does not exist yet.
/// Safe to retry: the pending payment and its remote intent are reused.
pub async fn checkout<B, G>(
    user: AuthenticatedUser,
    body: web::Json<CheckoutParams>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    let params = body.into_inner();
    debug!("💻️ POST checkout order {} for {}", params.order_id, user.id);
    let summary = api.create_checkout(params.order_id, &user.id).await?;
    Ok(HttpResponse::Created().json(summary))
}

route!(verify_payment => Post "/payments/verify" settles SettlementDatabase, OrderManagement);
/// The client-confirmation path. The gateway webhook remains authoritative; this merely accelerates the UX when the
/// client returns from the gateway before the webhook lands.
pub async fn verify_payment<B, G>(
    user: AuthenticatedUser,
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    let req = body.into_inner();
    debug!("💻️ POST verify payment {} for {}", req.payment_id, user.id);
    let payment = api.verify_payment(req).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(fail_payment => Post "/payments/fail" settles SettlementDatabase, OrderManagement);
pub async fn fail_payment<B, G>(
    user: AuthenticatedUser,
    body: web::Json<FailPaymentParams>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    let params = body.into_inner();
    debug!("💻️ POST fail payment {} for {}: {}", params.payment_id, user.id, params.reason);
    let payment = api.fail_payment(params.payment_id, &params.reason).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(cancel_payment => Post "/payments/{id}/cancel" settles SettlementDatabase, OrderManagement);
pub async fn cancel_payment<B, G>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    let payment_id = path.into_inner();
    debug!("💻️ POST cancel payment {payment_id} for {}", user.id);
    let payment = api.cancel_payment(payment_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(refund_payment => Post "/payments/{id}/refund" settles SettlementDatabase, OrderManagement where requires [Role::Admin]);
pub async fn refund_payment<B, G>(
    path: web::Path<i64>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    let payment_id = path.into_inner();
    debug!("💻️ POST refund payment {payment_id}");
    let payment = api.refund_payment(payment_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(reconcile_order => Post "/orders/{id}/reconcile" settles SettlementDatabase, OrderManagement where requires [Role::Admin]);
/// Repairs an order left stale by a crash between its payment's settlement and the order cascade.
pub async fn reconcile_order<B, G>(
    path: web::Path<i64>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    let order_id = path.into_inner();
    debug!("💻️ POST reconcile order {order_id}");
    let order = api.reconcile_order(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(my_payments => Get "/payments" impl SettlementDatabase, OrderManagement, TemplateCatalog);
pub async fn my_payments<B>(
    user: AuthenticatedUser,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement + TemplateCatalog,
{
    debug!("💻️ GET my payments for {}", user.id);
    let payments = api.my_payments(&user.id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(all_payments => Get "/payments/all" impl SettlementDatabase, OrderManagement, TemplateCatalog where requires [Role::Admin]);
pub async fn all_payments<B>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError>
where B: SettlementDatabase + OrderManagement + TemplateCatalog
{
    debug!("💻️ GET all payments");
    let payments = api.all_payments().await?;
    Ok(HttpResponse::Ok().json(payments))
}

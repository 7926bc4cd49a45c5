//----------------------------------------------   Gateway webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info, warn};
use template_market_engine::{
    payment_objects::WebhookOutcome,
    OrderManagement,
    PaymentGateway,
    SettlementApi,
    SettlementDatabase,
    SettlementError,
};

use crate::{
    config::ProxyConfig,
    data_objects::JsonResponse,
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::razorpay::capture_from_webhook_body,
    route,
};

route!(gateway_webhook => Post "/webhook" settles SettlementDatabase, OrderManagement);
/// The payment gateway's webhook endpoint. The HMAC middleware has already authenticated the body by the time this
/// handler runs.
///
/// Response discipline: the gateway retries any non-2xx response, so everything that is recognized-but-irrelevant
/// (other event types, unknown remote order ids) or an idempotent duplicate is acknowledged with 200. Non-200
/// responses are reserved for payloads we could not parse and for captures that contradict the ledger; those need
/// operator attention, and a retry storm is preferable to silently dropping them.
pub async fn gateway_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<SettlementApi<B, G>>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase + OrderManagement,
    G: PaymentGateway,
{
    let capture = match capture_from_webhook_body(&body) {
        Err(e) => {
            let peer = get_remote_ip(&req, proxy.use_x_forwarded_for, proxy.use_forwarded);
            warn!("🛒️ Unparseable webhook payload from {peer:?}: {e}");
            return Err(ServerError::InvalidRequestBody(e.to_string()));
        },
        Ok(None) => {
            debug!("🛒️ Ignoring webhook event that is not a payment capture");
            return Ok(HttpResponse::Ok().json(JsonResponse::success("Ignored")));
        },
        Ok(Some(capture)) => capture,
    };
    match api.payment_captured(capture).await {
        Ok(WebhookOutcome::Settled(payment)) => {
            info!("🛒️ Webhook settled payment #{}", payment.id);
            Ok(HttpResponse::Ok().json(JsonResponse::success("OK")))
        },
        Ok(WebhookOutcome::AlreadyProcessed) => Ok(HttpResponse::Ok().json(JsonResponse::success("Already processed"))),
        Ok(WebhookOutcome::UnknownPayment) => Ok(HttpResponse::Ok().json(JsonResponse::success("OK"))),
        Err(e @ (SettlementError::AmountMismatch { .. } | SettlementError::CurrencyMismatch { .. })) => Err(e.into()),
        Err(e) => {
            warn!("🛒️ Unexpected error while handling payment capture. {e}");
            Err(ServerError::BackendError(e.to_string()))
        },
    }
}

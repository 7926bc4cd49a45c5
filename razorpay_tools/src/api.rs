use std::sync::Arc;

use log::*;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::RazorpayConfig, data_objects::{RemoteOrder, RemoteOrderRequest}, RazorpayApiError};

/// A thin client over the gateway's REST API. Only the order-intent surface is implemented; captures and refunds
/// arrive via webhooks rather than being polled.
#[derive(Clone)]
pub struct RazorpayApi {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl RazorpayApi {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let client = Client::builder().build().map_err(|e| RazorpayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &RazorpayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RazorpayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RazorpayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| RazorpayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RazorpayApiError::RestResponseError(e.to_string()))?;
            Err(RazorpayApiError::QueryError { status, message })
        }
    }

    /// Creates a remote order (payment intent) on the gateway. The amount is given in minor units.
    pub async fn create_order(&self, request: RemoteOrderRequest) -> Result<RemoteOrder, RazorpayApiError> {
        if request.amount <= 0 {
            return Err(RazorpayApiError::InvalidCurrencyAmount(format!(
                "Remote orders must be for a positive amount, not {}",
                request.amount
            )));
        }
        debug!("Creating remote order for {} {} (receipt {})", request.amount, request.currency, request.receipt);
        let order: RemoteOrder = self.rest_query(Method::POST, "/v1/orders", Some(&request)).await?;
        debug!("Remote order {} created", order.id);
        Ok(order)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }
}

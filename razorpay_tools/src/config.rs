use log::*;
use tmg_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct RazorpayConfig {
    /// The base URL of the Razorpay REST API. Overridable for tests and sandboxes.
    pub api_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub webhook_secret: Secret<String>,
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("TMG_RAZORPAY_API_URL").unwrap_or_else(|_| {
            info!("TMG_RAZORPAY_API_URL not set, using https://api.razorpay.com as default");
            "https://api.razorpay.com".to_string()
        });
        let key_id = std::env::var("TMG_RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            warn!("TMG_RAZORPAY_KEY_ID not set, using (probably useless) default");
            "rzp_test_0000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("TMG_RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("TMG_RAZORPAY_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("TMG_RAZORPAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("TMG_RAZORPAY_WEBHOOK_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        Self { api_url, key_id, key_secret, webhook_secret }
    }
}

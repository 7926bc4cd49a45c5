use std::env;

use log::*;
use razorpay_tools::RazorpayConfig;

const DEFAULT_TMG_HOST: &str = "127.0.0.1";
const DEFAULT_TMG_PORT: u16 = 4880;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Payment gateway configuration, including the webhook HMAC secret.
    pub gateway_config: RazorpayConfig,
    /// When false, webhook HMAC signatures are not verified. Only ever disable this in local testing.
    pub hmac_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TMG_HOST.to_string(),
            port: DEFAULT_TMG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            gateway_config: RazorpayConfig::default(),
            hmac_checks: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TMG_HOST").ok().unwrap_or_else(|| DEFAULT_TMG_HOST.into());
        let port = env::var("TMG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TMG_PORT. {e} Using the default, {DEFAULT_TMG_PORT}, instead."
                    );
                    DEFAULT_TMG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TMG_PORT);
        let database_url = env::var("TMG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TMG_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let use_x_forwarded_for =
            env::var("TMG_USE_X_FORWARDED_FOR").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        let use_forwarded = env::var("TMG_USE_FORWARDED").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        let gateway_config = RazorpayConfig::new_from_env_or_default();
        let hmac_checks = env::var("TMG_RAZORPAY_HMAC_CHECKS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        if !hmac_checks {
            warn!(
                "🚨️ Webhook HMAC checks are DISABLED. Anyone can forge payment confirmations. Do not run a \
                 production instance like this."
            );
        }
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, gateway_config, hmac_checks }
    }
}

//-------------------------------------------------  ProxyConfig  -----------------------------------------------------
/// The subset of the server configuration that request handlers need when inspecting connection metadata. Kept small
/// and free of secrets so it can be cloned into the app data freely.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyConfig {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ProxyConfig {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

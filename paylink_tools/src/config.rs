use log::*;
use splitpay_common::Secret;

pub const DEFAULT_PAYLINK_API_URL: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone, Default)]
pub struct PaymentLinkConfig {
    /// Base URL of the REST API, without a trailing slash
    pub api_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
}

impl PaymentLinkConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("SPG_PAYLINK_API_URL").unwrap_or_else(|_| {
            info!("🔗️ SPG_PAYLINK_API_URL not set, using {DEFAULT_PAYLINK_API_URL} as default");
            DEFAULT_PAYLINK_API_URL.to_string()
        });
        let key_id = std::env::var("SPG_PAYLINK_KEY_ID").unwrap_or_else(|_| {
            warn!("🔗️ SPG_PAYLINK_KEY_ID not set. Payment link requests will be rejected by the gateway.");
            String::default()
        });
        let key_secret = Secret::new(std::env::var("SPG_PAYLINK_KEY_SECRET").unwrap_or_else(|_| {
            warn!("🔗️ SPG_PAYLINK_KEY_SECRET not set. Payment link requests will be rejected by the gateway.");
            String::default()
        }));
        Self { api_url: api_url.trim_end_matches('/').to_string(), key_id, key_secret }
    }

    pub fn is_configured(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_empty()
    }
}

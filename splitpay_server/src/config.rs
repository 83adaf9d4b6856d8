use std::env;

use log::*;
use paylink_tools::PaymentLinkConfig;
use splitpay_common::{helpers::parse_boolean_flag, Secret, DEFAULT_CURRENCY_CODE};
use splitpay_engine::{RetryPolicy, SplitPaymentOptions};

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8370;
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
/// The header the gateway puts the webhook signature in.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Paylink-Signature";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    /// The public base URL of this server, used to build the payment link callback URLs. Without it, payers are not
    /// redirected back here after paying, and only webhook calls report payments.
    pub public_url: Option<String>,
    /// ISO currency code for payment links
    pub currency: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    pub paylink_config: PaymentLinkConfig,
    pub webhook_config: WebhookConfig,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// The shared secret the gateway signs webhook bodies with
    pub hmac_secret: Secret<String>,
    /// If false, webhook signatures are not checked at all. **DANGER**
    pub hmac_checks: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { hmac_secret: Secret::default(), hmac_checks: true }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            public_url: None,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            paylink_config: PaymentLinkConfig::default(),
            webhook_config: WebhookConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_DATABASE_URL is not set. Please set it to the URL for the split payment database.");
            String::default()
        });
        let max_db_connections = env::var("SPG_MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SPG_MAX_DB_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_DB_CONNECTIONS);
        let public_url = env::var("SPG_PUBLIC_URL").ok().filter(|s| !s.trim().is_empty()).or_else(|| {
            warn!(
                "🪛️ SPG_PUBLIC_URL is not set. Payers will not be redirected back after paying, and payments will \
                 only be reported by webhook calls."
            );
            None
        });
        let currency = env::var("SPG_CURRENCY").map(|s| s.to_uppercase()).unwrap_or_else(|_| {
            info!("🪛️ SPG_CURRENCY is not set. Using {DEFAULT_CURRENCY_CODE}.");
            DEFAULT_CURRENCY_CODE.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SPG_USE_FORWARDED").ok(), false);
        let paylink_config = PaymentLinkConfig::new_from_env_or_default();
        let webhook_config = WebhookConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_db_connections,
            public_url,
            currency,
            use_x_forwarded_for,
            use_forwarded,
            paylink_config,
            webhook_config,
        }
    }

    /// The options the split payment API runs with.
    pub fn split_payment_options(&self) -> SplitPaymentOptions {
        SplitPaymentOptions {
            currency: self.currency.clone(),
            callback_base_url: self.public_url.clone(),
            retry: RetryPolicy::default(),
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let hmac_secret = env::var("SPG_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ SPG_WEBHOOK_SECRET is not set. Please set it to the secret the payment gateway signs webhook \
                 calls with."
            );
            String::default()
        });
        let hmac_checks = parse_boolean_flag(env::var("SPG_WEBHOOK_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Webhook signature checks are DISABLED. Anyone can report payments. Never do this in production.");
        }
        Self { hmac_secret: Secret::new(hmac_secret), hmac_checks }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

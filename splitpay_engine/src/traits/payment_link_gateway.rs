use serde::{Deserialize, Serialize};
use splitpay_common::Paise;
use thiserror::Error;

/// The person a payment link is addressed to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentLinkRequest {
    pub amount: Paise,
    pub currency: String,
    pub payer: Payer,
    /// Our reference for the link, echoed back by the gateway.
    pub reference_id: String,
    pub description: String,
    /// Where the gateway redirects the payer after paying.
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuedPaymentLink {
    pub id: String,
    pub short_url: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("The gateway rejected the request. {0}")]
    Rejected(String),
    #[error("The gateway is unavailable. {0}")]
    Unavailable(String),
}

/// A hosted payment-link provider. One link is issued for each contributor of a split payment.
#[allow(async_fn_in_trait)]
pub trait PaymentLinkGateway: Clone {
    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<IssuedPaymentLink, GatewayError>;
}

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The payer details attached to a payment link.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LinkCustomer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LinkNotify {
    pub sms: bool,
    pub email: bool,
}

/// Request body for creating a payment link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewPaymentLink {
    /// Amount in the currency's minor unit
    pub amount: i64,
    pub currency: String,
    pub accept_partial: bool,
    pub reference_id: String,
    pub description: String,
    pub customer: LinkCustomer,
    pub notify: LinkNotify,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_method: Option<String>,
}

impl NewPaymentLink {
    pub fn new<S: Into<String>>(amount: i64, currency: S, reference_id: S, customer: LinkCustomer) -> Self {
        Self {
            amount,
            currency: currency.into(),
            accept_partial: false,
            reference_id: reference_id.into(),
            description: String::default(),
            customer,
            notify: LinkNotify::default(),
            callback_url: None,
            callback_method: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// The gateway redirects the payer to `url` (with a GET request) once the payment completes.
    pub fn with_callback<S: Into<String>>(mut self, url: S) -> Self {
        self.callback_url = Some(url.into());
        self.callback_method = Some("get".to_string());
        self
    }

    pub fn with_notifications(mut self, sms: bool, email: bool) -> Self {
        self.notify = LinkNotify { sms, email };
        self
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentLinkStatus {
    Created,
    PartiallyPaid,
    Paid,
    Expired,
    Cancelled,
}

impl Display for PaymentLinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentLinkStatus::Created => write!(f, "created"),
            PaymentLinkStatus::PartiallyPaid => write!(f, "partially_paid"),
            PaymentLinkStatus::Paid => write!(f, "paid"),
            PaymentLinkStatus::Expired => write!(f, "expired"),
            PaymentLinkStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A payment link as returned by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentLink {
    pub id: String,
    pub short_url: String,
    pub status: PaymentLinkStatus,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub reference_id: Option<String>,
}

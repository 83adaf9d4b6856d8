use std::fmt::Display;

use paylink_tools::PaymentLinkStatus;
use serde::{Deserialize, Serialize};
use splitpay_engine::{
    db_types::OrderId,
    traits::{CoPaymentRef, ContributorSignal, SignalStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Maps a payment link status onto a contributor signal. Links that are still open (or only partly paid) say nothing
/// about the contributor yet.
pub fn signal_status(status: PaymentLinkStatus) -> Option<SignalStatus> {
    match status {
        PaymentLinkStatus::Paid => Some(SignalStatus::Paid),
        PaymentLinkStatus::Expired | PaymentLinkStatus::Cancelled => Some(SignalStatus::Failed),
        PaymentLinkStatus::Created | PaymentLinkStatus::PartiallyPaid => None,
    }
}

/// The body of a payment link webhook call. The co-payment can be identified by its id or by its order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLinkNotification {
    #[serde(default)]
    pub co_payment_id: Option<i64>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub payment_link_id: String,
    pub status: PaymentLinkStatus,
}

impl PaymentLinkNotification {
    pub fn co_payment(&self) -> Option<CoPaymentRef> {
        match (self.co_payment_id, &self.order_id) {
            (Some(id), _) => Some(CoPaymentRef::Id(id)),
            (None, Some(order_id)) => Some(CoPaymentRef::Order(order_id.clone())),
            (None, None) => None,
        }
    }

    /// The signal this notification carries, if any.
    pub fn signal(&self) -> Option<ContributorSignal> {
        let co_payment = self.co_payment()?;
        let status = signal_status(self.status)?;
        Some(ContributorSignal::new(co_payment, self.payment_link_id.clone(), status))
    }
}

/// Query parameters the gateway appends when it redirects a payer back to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentLinkCallback {
    pub payment_link_id: String,
    pub payment_link_status: PaymentLinkStatus,
}

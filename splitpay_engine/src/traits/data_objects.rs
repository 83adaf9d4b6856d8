use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{CoPayment, Contributor, Order, OrderId, OrderStatusHistory};

/// Identifies a co-payment either by its id or by the order it pays for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoPaymentRef {
    Id(i64),
    Order(OrderId),
}

impl Display for CoPaymentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoPaymentRef::Id(id) => write!(f, "co-payment {id}"),
            CoPaymentRef::Order(oid) => write!(f, "co-payment for order {oid}"),
        }
    }
}

impl From<i64> for CoPaymentRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<OrderId> for CoPaymentRef {
    fn from(order_id: OrderId) -> Self {
        Self::Order(order_id)
    }
}

/// The outcome a gateway reports for a single payment link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Paid,
    Failed,
}

impl Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::Paid => write!(f, "paid"),
            SignalStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A per-contributor status signal, from a webhook, a redirect callback or a poll. The same signal may be delivered
/// more than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorSignal {
    pub co_payment: CoPaymentRef,
    pub payment_link_id: String,
    pub status: SignalStatus,
}

impl ContributorSignal {
    pub fn new<R: Into<CoPaymentRef>, S: Into<String>>(co_payment: R, payment_link_id: S, status: SignalStatus) -> Self {
        Self { co_payment: co_payment.into(), payment_link_id: payment_link_id.into(), status }
    }

    pub fn paid<R: Into<CoPaymentRef>, S: Into<String>>(co_payment: R, payment_link_id: S) -> Self {
        Self::new(co_payment, payment_link_id, SignalStatus::Paid)
    }

    pub fn failed<R: Into<CoPaymentRef>, S: Into<String>>(co_payment: R, payment_link_id: S) -> Self {
        Self::new(co_payment, payment_link_id, SignalStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalEffect {
    /// The contributor moved to `Paid`.
    ContributorPaid,
    /// The contributor moved from `Pending` to `Failed`.
    ContributorFailed,
    /// The signal was a duplicate, or would have downgraded a paid contributor. Nothing was written.
    NoOp,
}

#[derive(Debug, Clone)]
pub struct SignalOutcome {
    /// The co-payment after the signal was applied
    pub co_payment: CoPayment,
    /// The contributor the signal was for, after the signal was applied
    pub contributor: Contributor,
    pub contributors: Vec<Contributor>,
    pub effect: SignalEffect,
    /// True only for the one signal that moved the co-payment to `Completed`
    pub newly_completed: bool,
}

#[derive(Debug, Clone)]
pub struct ConfirmationOutcome {
    pub co_payment: CoPayment,
    pub order: Order,
    pub history: OrderStatusHistory,
    /// True if the order was created from the snapshot, false if an existing order was updated
    pub created: bool,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use splitpay_common::Paise;

use crate::{
    db_types::{CoPayment, CoPaymentStatus, Contributor, ContributorStatus, ContributorTally, NewContributor, OrderId},
    order_snapshot::OrderDraft,
    traits::SignalEffect,
};

/// What the payer sees when their link could not be issued.
pub const LINK_UNAVAILABLE_MESSAGE: &str = "Payment link unavailable, please retry";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSplitPayment {
    /// The order number, if the order already has one. Otherwise one is generated.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub order: OrderDraft,
    pub contributors: Vec<NewContributor>,
}

impl NewSplitPayment {
    pub fn new(order: OrderDraft, contributors: Vec<NewContributor>) -> Self {
        Self { order_id: None, order, contributors }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// The result of trying to issue a payment link for one contributor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkIssueResult {
    pub contributor_id: i64,
    pub name: String,
    pub amount: Paise,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LinkIssueResult {
    pub fn issued(contributor: &Contributor, url: String) -> Self {
        Self {
            contributor_id: contributor.id,
            name: contributor.name.clone(),
            amount: contributor.amount,
            payment_url: Some(url),
            error: None,
        }
    }

    pub fn unavailable(contributor: &Contributor) -> Self {
        Self {
            contributor_id: contributor.id,
            name: contributor.name.clone(),
            amount: contributor.amount,
            payment_url: None,
            error: Some(LINK_UNAVAILABLE_MESSAGE.to_string()),
        }
    }

    pub fn is_issued(&self) -> bool {
        self.payment_url.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPaymentCreated {
    pub co_payment_id: i64,
    pub order_id: OrderId,
    pub status: CoPaymentStatus,
    pub currency: String,
    pub total_amount: Paise,
    pub contributors: Vec<LinkIssueResult>,
}

impl SplitPaymentCreated {
    pub fn links_issued(&self) -> usize {
        self.contributors.iter().filter(|c| c.is_issued()).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContributorProgress {
    pub id: i64,
    pub name: String,
    pub amount: Paise,
    pub status: ContributorStatus,
    pub link_issued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<&Contributor> for ContributorProgress {
    fn from(c: &Contributor) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            amount: c.amount,
            status: c.status,
            link_issued: c.has_link(),
            payment_url: c.payment_url.clone(),
            paid_at: c.paid_at,
        }
    }
}

/// The current state of a co-payment, as shown to payers and operators. Counts and the collected amount are derived
/// from the contributor rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoPaymentSnapshot {
    pub co_payment_id: i64,
    pub order_id: OrderId,
    pub status: CoPaymentStatus,
    pub currency: String,
    pub total_amount: Paise,
    pub collected_amount: Paise,
    pub completion_percentage: u8,
    pub contributor_count: usize,
    pub paid_count: usize,
    pub pending_count: usize,
    pub failed_count: usize,
    pub contributors: Vec<ContributorProgress>,
    pub completed_at: Option<DateTime<Utc>>,
    pub confirmed: bool,
}

impl CoPaymentSnapshot {
    pub fn new(co_payment: &CoPayment, contributors: &[Contributor]) -> Self {
        let tally = ContributorTally::new(contributors);
        Self {
            co_payment_id: co_payment.id,
            order_id: co_payment.order_id.clone(),
            status: co_payment.status,
            currency: co_payment.currency.clone(),
            total_amount: co_payment.total_amount,
            collected_amount: tally.collected,
            completion_percentage: tally.completion_percentage(),
            contributor_count: tally.total,
            paid_count: tally.paid,
            pending_count: tally.pending,
            failed_count: tally.failed,
            contributors: contributors.iter().map(ContributorProgress::from).collect(),
            completed_at: co_payment.completed_at,
            confirmed: co_payment.is_confirmed(),
        }
    }
}

/// The response to a status signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalReceipt {
    pub effect: SignalEffect,
    /// True if this signal completed the co-payment
    pub completed_now: bool,
    /// True if the order was confirmed as a result of this signal
    pub confirmed_now: bool,
    pub snapshot: CoPaymentSnapshot,
}

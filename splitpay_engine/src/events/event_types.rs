use serde::{Deserialize, Serialize};

use crate::db_types::{CoPayment, Contributor, Order, OrderId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorPaidEvent {
    pub co_payment_id: i64,
    pub order_id: OrderId,
    pub contributor: Contributor,
}

impl ContributorPaidEvent {
    pub fn new(co_payment: &CoPayment, contributor: Contributor) -> Self {
        Self { co_payment_id: co_payment.id, order_id: co_payment.order_id.clone(), contributor }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedEvent {
    pub co_payment_id: i64,
    pub order: Order,
    /// True if the order was created from the co-payment snapshot
    pub created: bool,
}

impl OrderConfirmedEvent {
    pub fn new(co_payment_id: i64, order: Order, created: bool) -> Self {
        Self { co_payment_id, order, created }
    }
}

/// A co-payment completed, but its order could not be confirmed. Someone needs to look at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyWarningEvent {
    pub co_payment_id: i64,
    pub order_id: OrderId,
    pub reason: String,
}

impl ConsistencyWarningEvent {
    pub fn new(co_payment_id: i64, order_id: OrderId, reason: String) -> Self {
        Self { co_payment_id, order_id, reason }
    }
}

#[derive(Debug, Clone)]
pub enum EventType {
    ContributorPaid(ContributorPaidEvent),
    OrderConfirmed(OrderConfirmedEvent),
    ConsistencyWarning(ConsistencyWarningEvent),
}

use crate::{
    db_types::{Order, OrderId, OrderItemRecord, OrderStatusHistory},
    traits::SplitPaymentError,
};

/// Read-only queries against confirmed orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, SplitPaymentError>;

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItemRecord>, SplitPaymentError>;

    /// The status history for the order, oldest entry first.
    async fn fetch_order_status_history(&self, order_id: &OrderId)
        -> Result<Vec<OrderStatusHistory>, SplitPaymentError>;
}

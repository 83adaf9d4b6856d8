use log::*;
use splitpay_engine::events::{
    ConsistencyWarningEvent,
    ContributorPaidEvent,
    EventHandlers,
    EventHooks,
    OrderConfirmedEvent,
};

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;
/// Log target for problems an operator has to resolve by hand.
pub const ALERT_LOG_TARGET: &str = "spg::alert";

/// Assigns event handlers that report split payment progress in the server logs.
///
/// 1. ContributorPaidEvent - one of the contributors has paid their share.
/// 2. OrderConfirmedEvent - a co-payment completed and its order was confirmed.
/// 3. ConsistencyWarningEvent - a co-payment completed but its order could not be confirmed. These go to the
///    [`ALERT_LOG_TARGET`] target so that they can be routed to whoever is on call.
pub fn create_notification_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_contributor_paid(|ev: ContributorPaidEvent| {
        Box::pin(async move {
            info!(
                "📬️ {} paid {} towards order {} (co-payment #{})",
                ev.contributor.name, ev.contributor.amount, ev.order_id, ev.co_payment_id
            );
        })
    });
    hooks.on_order_confirmed(|ev: OrderConfirmedEvent| {
        Box::pin(async move {
            let how = if ev.created { "created and confirmed" } else { "confirmed" };
            info!("📬️ Order {} was {how}. Co-payment #{} is settled.", ev.order.order_id, ev.co_payment_id);
        })
    });
    hooks.on_consistency_warning(|ev: ConsistencyWarningEvent| {
        Box::pin(async move {
            error!(
                target: ALERT_LOG_TARGET,
                "📬️ Co-payment #{} for order {} is fully paid, but the order could not be confirmed. {} Confirm it \
                 manually with POST /api/split_payments/{}/confirm once the problem is fixed.",
                ev.co_payment_id, ev.order_id, ev.reason, ev.co_payment_id
            );
        })
    });
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}

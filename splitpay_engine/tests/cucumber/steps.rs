use std::{str::FromStr, time::Duration};

use cucumber::{then, when};
use splitpay_engine::{
    db_types::{CoPaymentStatus, ContributorStatus, NewContributor, OrderId, OrderStatusType, Paise},
    split_payment_objects::NewSplitPayment,
    test_utils::fixtures::cake_order,
    traits::{ContributorSignal, OrderManagement, SplitPaymentDatabase},
    SplitPaymentError,
};

use crate::cucumber::SplitPaymentWorld;

/// Parses "Asha:300, Ravi:200" into names and rupee amounts.
fn parse_shares(shares: &str) -> Vec<(String, i64)> {
    shares
        .split(',')
        .map(|share| {
            let (name, rupees) = share.trim().split_once(':').expect("Shares look like 'Name:amount'");
            (name.trim().to_string(), rupees.trim().parse::<i64>().expect("Not a valid amount"))
        })
        .collect()
}

//         When order CK-1001 for 500 INR is split as "Asha:300, Ravi:200"
#[when(expr = "order {word} for {int} INR is split as {string}")]
async fn create_split_payment(world: &mut SplitPaymentWorld, order_id: String, rupees: i64, shares: String) {
    let system = world.system();
    let contributors = parse_shares(&shares)
        .into_iter()
        .map(|(name, amount)| {
            let email = format!("{}@example.com", name.to_lowercase());
            NewContributor::with_email(name, email, Paise::from_rupees(amount))
        })
        .collect();
    let order = cake_order(system.vendor.id, system.cake.id, Paise::from_rupees(rupees));
    let request = NewSplitPayment::new(order, contributors).with_order_id(OrderId::from(order_id));
    let result = world.api().create_split_payment(request).await;
    world.record(result);
}

async fn link_for(world: &SplitPaymentWorld, order_id: &str, name: &str) -> (i64, String) {
    let status = world.status_of(order_id).await;
    let contributors = world.api().db().fetch_contributors(status.co_payment_id).await.expect("Error fetching contributors");
    let link = contributors
        .into_iter()
        .find(|c| c.name == name)
        .and_then(|c| c.payment_link_id)
        .unwrap_or_else(|| panic!("{name} has no payment link for order {order_id}"));
    (status.co_payment_id, link)
}

#[when(expr = "the gateway reports that '{word}' paid for order {word}")]
async fn contributor_paid(world: &mut SplitPaymentWorld, name: String, order_id: String) {
    let (_, link) = link_for(world, &order_id, &name).await;
    let signal = ContributorSignal::paid(OrderId::from(order_id), link);
    let result = world.api().process_signal(signal).await;
    world.record(result);
}

#[when(expr = "the gateway reports that the payment by '{word}' for order {word} failed")]
async fn contributor_failed(world: &mut SplitPaymentWorld, name: String, order_id: String) {
    let (id, link) = link_for(world, &order_id, &name).await;
    let result = world.api().process_signal(ContributorSignal::failed(id, link)).await;
    world.record(result);
}

#[when(expr = "a payment signal for order {word} arrives with link {word}")]
async fn foreign_link(world: &mut SplitPaymentWorld, order_id: String, link: String) {
    let status = world.status_of(&order_id).await;
    let result = world.api().process_signal(ContributorSignal::paid(status.co_payment_id, link)).await;
    world.record(result);
}

#[when(expr = "the payment link for '{word}' on order {word} is reissued")]
async fn reissue(world: &mut SplitPaymentWorld, name: String, order_id: String) {
    let status = world.status_of(&order_id).await;
    let contributor = status.contributors.iter().find(|c| c.name == name).expect("No such contributor");
    let result = world.api().reissue_payment_link(status.co_payment_id, contributor.id).await;
    world.record(result);
}

#[when(expr = "order {word} is abandoned")]
async fn abandon(world: &mut SplitPaymentWorld, order_id: String) {
    let status = world.status_of(&order_id).await;
    let result = world.api().abandon(status.co_payment_id).await;
    world.record(result);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut SplitPaymentWorld, ms: u64) {
    let delay = Duration::from_millis(ms);
    tokio::time::sleep(delay).await;
}

#[then(expr = "the co-payment for order {word} is {word} with {int}% complete")]
async fn check_status(world: &mut SplitPaymentWorld, order_id: String, status: String, percent: u8) {
    let expected = CoPaymentStatus::from_str(&status).expect("Not a valid co-payment status");
    let snapshot = world.status_of(&order_id).await;
    assert_eq!(snapshot.status, expected, "Co-payment status is incorrect");
    assert_eq!(snapshot.completion_percentage, percent, "Completion percentage is incorrect");
}

#[then(expr = "the co-payment for order {word} has collected {int} INR")]
async fn check_collected(world: &mut SplitPaymentWorld, order_id: String, rupees: i64) {
    let snapshot = world.status_of(&order_id).await;
    assert_eq!(snapshot.collected_amount, Paise::from_rupees(rupees), "Collected amount is incorrect");
}

#[then(expr = "order {word} has {int} payment links")]
async fn check_link_count(world: &mut SplitPaymentWorld, order_id: String, count: usize) {
    let snapshot = world.status_of(&order_id).await;
    assert_eq!(snapshot.contributors.iter().filter(|c| c.link_issued).count(), count, "Wrong number of links");
}

#[then(expr = "'{word}' has no payment link for order {word}")]
async fn check_no_link(world: &mut SplitPaymentWorld, name: String, order_id: String) {
    let snapshot = world.status_of(&order_id).await;
    let contributor = snapshot.contributors.iter().find(|c| c.name == name).expect("No such contributor");
    assert!(!contributor.link_issued, "{name} has a payment link");
    assert_eq!(contributor.status, ContributorStatus::Pending);
}

#[then(expr = "'{word}' is {word} for order {word}")]
async fn check_contributor_status(world: &mut SplitPaymentWorld, name: String, status: String, order_id: String) {
    let expected = ContributorStatus::from_str(&status).expect("Not a valid contributor status");
    let snapshot = world.status_of(&order_id).await;
    let contributor = snapshot.contributors.iter().find(|c| c.name == name).expect("No such contributor");
    assert_eq!(contributor.status, expected, "Contributor status is incorrect");
}

#[then(expr = "order {word} is confirmed")]
async fn check_order_confirmed(world: &mut SplitPaymentWorld, order_id: String) {
    let id = OrderId::from(order_id);
    let order = world.api().db().fetch_order_by_order_id(&id).await.expect("Error fetching order");
    let order = order.expect("Order has not been created");
    assert_eq!(order.status, OrderStatusType::Confirmed);
    assert!(world.status_of(id.as_str()).await.confirmed, "Co-payment is not marked as confirmed");
}

#[then(expr = "order {word} does not exist yet")]
async fn check_no_order(world: &mut SplitPaymentWorld, order_id: String) {
    let order = world.api().db().fetch_order_by_order_id(&OrderId::from(order_id)).await.expect("Error fetching order");
    assert!(order.is_none(), "Order should not exist");
}

#[then(expr = "order {word} has {int} status history entries")]
async fn check_history(world: &mut SplitPaymentWorld, order_id: String, count: usize) {
    let history = world
        .api()
        .db()
        .fetch_order_status_history(&OrderId::from(order_id))
        .await
        .expect("Error fetching history");
    assert_eq!(history.len(), count, "Wrong number of history entries");
}

#[then(expr = "the request is rejected as {word}")]
async fn check_rejection(world: &mut SplitPaymentWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    let matched = match kind.as_str() {
        "invalid" => matches!(err, SplitPaymentError::ValidationError(_)),
        "duplicate" => matches!(err, SplitPaymentError::CoPaymentAlreadyExists(_)),
        "unknown-link" => matches!(err, SplitPaymentError::PaymentLinkNotFound(_)),
        "illegal" => matches!(err, SplitPaymentError::IllegalTransition(_)),
        "upstream" => matches!(err, SplitPaymentError::UpstreamGatewayError(_)),
        _ => panic!("Unknown rejection kind: {kind}"),
    };
    assert!(matched, "Unexpected error: {err}");
}

#[then("the request succeeds")]
async fn check_success(world: &mut SplitPaymentWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}

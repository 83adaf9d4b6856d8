use cucumber::given;

use crate::cucumber::{SplitPaymentSystem, SplitPaymentWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut SplitPaymentWorld) {
    let system = SplitPaymentSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "the payment gateway cannot issue links for '{word}'")]
async fn gateway_outage(world: &mut SplitPaymentWorld, payer: String) {
    world.system().gateway.fail_for(&payer);
}

#[given(expr = "the payment gateway recovers for '{word}'")]
async fn gateway_recovers(world: &mut SplitPaymentWorld, payer: String) {
    world.system().gateway.recover_for(&payer);
}

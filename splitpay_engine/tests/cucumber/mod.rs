mod setups;
mod split_payment_world;
mod steps;

pub use split_payment_world::{SplitPaymentSystem, SplitPaymentWorld};

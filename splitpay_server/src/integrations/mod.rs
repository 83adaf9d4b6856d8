//! Glue between the split payment engine and the outside world.
//!
//! * [`payment_links`] issues contributor payment links through the hosted payment-link gateway.
//! * [`notifications`] wires the engine events up to the server logs.
pub mod notifications;
pub mod payment_links;

//! A thin client for a hosted payment-link REST API.
//!
//! The gateway issues one hosted checkout page ("payment link") per payer. The split payment engine treats the gateway
//! as a black box: it only needs to create links, and optionally look them up again when reconciling.
mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::PaymentLinkApi;
pub use config::PaymentLinkConfig;
pub use data_objects::{LinkCustomer, LinkNotify, NewPaymentLink, PaymentLink, PaymentLinkStatus};
pub use error::PaymentLinkApiError;

//! # Interface contracts
//!
//! This module defines the behaviour that the split payment engine needs from its collaborators.
//!
//! * [`SplitPaymentDatabase`] defines the highest level of behaviour for storage backends. Every mutation of a
//!   co-payment and its contributors happens inside one of its methods, in a single transaction.
//! * [`OrderManagement`] provides read-only queries for orders and their status history.
//! * [`PaymentLinkGateway`] is the hosted payment-link provider that issues one link per contributor.
mod data_objects;
mod order_management;
mod payment_link_gateway;
mod split_payment_database;

pub use data_objects::{
    CoPaymentRef,
    ConfirmationOutcome,
    ContributorSignal,
    SignalEffect,
    SignalOutcome,
    SignalStatus,
};
pub use order_management::OrderManagement;
pub use payment_link_gateway::{GatewayError, IssuedPaymentLink, Payer, PaymentLinkGateway, PaymentLinkRequest};
pub use split_payment_database::{SplitPaymentDatabase, SplitPaymentError};

//! Split Payment Engine
//!
//! A cake order can be paid for by several people. Each contributor gets their own hosted payment link for their
//! share. This library keeps track of who has paid, decides when the order is fully paid, and confirms the order
//! exactly once when that happens.
//!
//! The library is divided into these main sections:
//! 1. Storage ([`traits`] and [`sqlite`]). The traits define what a backend has to provide. [`SqliteDatabase`] is
//!    the only backend. You should never need to access the database directly. The exception is the data types used
//!    in the database, which are defined in the [`db_types`] module and are public.
//! 2. The public API ([`spg_api`]). [`SplitPaymentApi`] creates split payments and reconciles payment status signals.
//!    [`OrderConfirmationApi`] confirms completed orders.
//!
//! The engine also emits events that can be subscribed to, for example when a contributor pays or when an order is
//! confirmed. See [`events`].
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod order_snapshot;
pub mod spg_api;
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use spg_api::{
    confirmation_api::OrderConfirmationApi,
    retry::RetryPolicy,
    split_payment_api::{SplitPaymentApi, SplitPaymentOptions},
    split_payment_objects,
};
pub use sqlite::SqliteDatabase;
pub use traits::{OrderManagement, PaymentLinkGateway, SplitPaymentDatabase, SplitPaymentError};

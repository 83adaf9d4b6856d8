//! # Split payment engine public API
//!
//! * [`split_payment_api`] creates co-payments, issues payment links and reconciles gateway status signals.
//! * [`confirmation_api`] confirms the order once every contributor has paid, and lets operators retry confirmations
//!   that failed.
//!
//! An API instance is created by supplying a database backend that implements [`crate::traits::SplitPaymentDatabase`]
//! and, for [`SplitPaymentApi`], a [`crate::traits::PaymentLinkGateway`]:
//!
//! ```rust,ignore
//! use splitpay_engine::{events::EventProducers, SplitPaymentApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/splitpay_store.db", 5).await?;
//! let api = SplitPaymentApi::new(db, my_gateway, EventProducers::default());
//! let status = api.status_for_order(&"CK20240611-3F9A1C".into()).await?;
//! ```
//!
//! [`SplitPaymentApi`]: split_payment_api::SplitPaymentApi
pub mod confirmation_api;
pub mod retry;
pub mod split_payment_api;
pub mod split_payment_objects;

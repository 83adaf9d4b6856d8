//! # Split payment server
//! This crate hosts the HTTP server for split payments. It is responsible for:
//! * Creating split payments for cake orders and handing out one payment link per contributor.
//! * Receiving payment status signals from the payment-link gateway (webhook calls and browser redirects) and passing
//!   them to the [`splitpay_engine::SplitPaymentApi`] for reconciliation.
//! * Exposing status queries and a handful of operator actions.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/split_payments`: Create split payments, query their status, and the operator actions.
//! * `/webhook/payment_link`: Payment link status notifications from the gateway. Signed with HMAC-SHA256.
//! * `/callback/split_payments/{id}`: Where the gateway redirects payers after they have paid.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;

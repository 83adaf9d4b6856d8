//! Helpers for tests in this crate and in crates that depend on it (enable the `test_utils` feature).
pub mod fixtures;
pub mod mock_gateway;
pub mod prepare_env;

pub use mock_gateway::MockGateway;
pub use prepare_env::{prepare_test_env, random_db_path};

use std::{future::Future, time::Duration};

use log::*;

use crate::traits::SplitPaymentError;

/// How often, and how patiently, an operation is retried when the database reports contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// The delay before the second attempt. Later attempts wait proportionally longer.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, backoff: Duration::from_millis(50) }
    }
}

impl RetryPolicy {
    pub fn no_retries() -> Self {
        Self { max_attempts: 1, backoff: Duration::ZERO }
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or runs out of attempts.
pub async fn retry_transient<T, F, Fut>(label: &str, policy: RetryPolicy, mut op: F) -> Result<T, SplitPaymentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SplitPaymentError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.backoff * attempt;
                warn!("🔄️ {label}: attempt {attempt}/{} failed. Retrying in {delay:?}. {e}", policy.max_attempts);
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            result => return result,
        }
    }
}

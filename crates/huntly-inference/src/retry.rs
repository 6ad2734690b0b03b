//! Bounded retry with incremental backoff for transient service failures.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use huntly_core::{defaults, Result};

/// Retry policy: bounded attempts, delay growing linearly per attempt
/// (base, 2×base, 3×base, ...).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(defaults::RETRY_BASE_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// A policy with no waiting, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Run `op` until it succeeds, fails permanently, or exhausts the policy.
///
/// Only errors reporting `is_transient()` are retried; deterministic
/// failures propagate immediately.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, op: F) -> Result<T>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let wait = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    wait_secs = wait.as_secs(),
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

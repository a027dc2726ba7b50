//! Fixed-delay retry on transient HTTP failures.
//!
//! Only 500 and 503 are retried. Everything else, including transport
//! errors, is returned after the first attempt.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{CodesError, CodesResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 25;
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// How many times to attempt a call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Run `op` until it succeeds, fails fatally, or runs out of attempts.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> CodesResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CodesResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_status = 0;

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                last_status = e.status().unwrap_or_default();
                if attempt == max_attempts {
                    break;
                }
                tracing::debug!(
                    "Transient failure ({e}), attempt {attempt}/{max_attempts}, retrying in {}ms",
                    policy.delay_ms
                );
                tokio::time::sleep(policy.delay()).await;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::warn!("Retries exhausted after {max_attempts} attempts (last status {last_status})");
    Err(CodesError::RetriesExhausted {
        attempts: max_attempts,
        last_status,
    })
}

use super::ProviderError;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries including the first one.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay_ms: 0,
        }
    }

    /// Exponential delay before retry number `retry` (0-based) plus up to
    /// half the base delay of jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let backoff = self.base_delay_ms.saturating_mul(2u64.pow(retry.min(5)));
        let jitter = thread_rng().gen_range(0..=self.base_delay_ms / 2);
        Duration::from_millis(backoff.saturating_add(jitter))
    }
}

/// Run `op`, retrying `Unavailable` failures. `Data` errors are returned
/// immediately since asking again yields the same payload.
pub fn retry_with_backoff<T, F>(policy: &RetryPolicy, mut op: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Result<T, ProviderError>,
{
    let attempts = policy.attempts.max(1);
    let mut retry = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_unavailable() && retry + 1 < attempts => {
                let delay = policy.delay_for(retry);
                tracing::warn!(error = %err, attempt = retry + 1, ?delay, "fetch failed, retrying");
                std::thread::sleep(delay);
                retry += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

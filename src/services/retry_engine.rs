//! Retry engine: exponential backoff with jitter for transfer jobs.
//!
//! Only transient errors (transport failures, 5xx rejections) are retried.
//! The retry loop runs inside a single job, so it never lets the next job
//! of a sequential batch start early.

use std::future::Future;

use crate::error::AppError;

/// Default initial backoff delay in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
/// Default maximum backoff delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
/// Default retries per job after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

pub fn is_retryable(err: &AppError) -> bool {
    err.is_transient()
}

/// Calculate exponential backoff delay with +/-10% jitter.
pub fn calculate_delay(attempt: u32, policy: &RetryPolicy) -> u64 {
    let base = policy
        .initial_delay_ms
        .saturating_mul(1u64 << attempt.min(31));
    let capped = base.min(policy.max_delay_ms);
    let jitter_range = capped / 10;
    if jitter_range == 0 {
        return capped;
    }
    // Deterministic jitter seeded by the attempt number.
    let jitter = (attempt as u64 * 7 + 13) % (jitter_range * 2 + 1);
    capped - jitter_range + jitter
}

/// Run `operation`, retrying transient failures per `policy`.
///
/// `label` names the job in log lines.
pub async fn retry_transfer<F, Fut, T>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> crate::error::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::error::Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !is_retryable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }

                let delay = calculate_delay(attempt, policy);
                log::warn!(
                    "Transfer retry: job={}, attempt={}, delay_ms={}, error={}",
                    label,
                    attempt + 1,
                    delay,
                    err
                );
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;

                attempt = attempt.saturating_add(1);
            }
        }
    }
}

// Retry logic with exponential backoff and shrinking per-attempt timeouts

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use super::error::ApiError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;
const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MIN_ATTEMPT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Timeout of the first attempt; halves on every retry.
    pub attempt_timeout_ms: u64,
    /// Floor for the shrinking per-attempt timeout.
    pub min_attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
            min_attempt_timeout_ms: DEFAULT_MIN_ATTEMPT_TIMEOUT_MS,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay = self
            .initial_backoff_ms
            .saturating_mul(exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }

    /// Timeout for the `attempt`-th try (1-based).
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        let shrunk = self.attempt_timeout_ms >> shift;
        let floor = self.min_attempt_timeout_ms.min(self.attempt_timeout_ms);
        Duration::from_millis(shrunk.max(floor))
    }
}

/// Execute `f` under `policy`, retrying transient failures with exponential backoff
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    what: &str,
    mut f: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        let error = match timeout(policy.timeout_for(attempt), f()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => ApiError::Timeout,
        };

        if !error.is_transient() || attempt == attempts {
            return Err(error);
        }

        let delay = policy.backoff_for(attempt);
        tracing::warn!(
            "{} failed (attempt {}/{}): {}; retrying in {:?}",
            what,
            attempt,
            attempts,
            error,
            delay
        );
        sleep(delay).await;
    }

    // attempts >= 1, so the loop always returns
    Err(ApiError::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            body: "busy".to_string(),
        }
    }

    // ── policy arithmetic ─────────────────────────────────────────────────────

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            initial_backoff_ms: 500,
            max_backoff_ms: 1_500,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(1_500));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(1_500));
    }

    #[test]
    fn test_attempt_timeout_shrinks_to_floor() {
        let policy = RetryPolicy {
            attempt_timeout_ms: 20_000,
            min_attempt_timeout_ms: 6_000,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.timeout_for(1), Duration::from_millis(20_000));
        assert_eq!(policy.timeout_for(2), Duration::from_millis(10_000));
        assert_eq!(policy.timeout_for(3), Duration::from_millis(6_000));
    }

    // ── retry loop ────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = with_retry(&RetryPolicy::default(), "fetch", move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = with_retry(&RetryPolicy::default(), "fetch", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ApiError::Status {
                    status: 404,
                    body: String::new(),
                })
            }
        })
        .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = with_retry(&RetryPolicy::default(), "fetch", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;
        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempts_time_out() {
        let policy = RetryPolicy {
            max_attempts: 2,
            attempt_timeout_ms: 1_000,
            min_attempt_timeout_ms: 500,
            ..RetryPolicy::default()
        };
        let result: Result<(), _> = with_retry(&policy, "slow", || async {
            sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ApiError::Timeout)));
    }
}

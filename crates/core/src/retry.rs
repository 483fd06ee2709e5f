//! Bounded exponential-backoff retry for remote calls.
//!
//! Every call to an external system that may fail transiently (blob storage,
//! cluster API, status polling) goes through [`with_retry`] with one of the
//! named [`RetryPolicy`] values.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Exponential backoff policy: the first retry waits `base_delay_ms`, each
/// following retry doubles the wait up to `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Total number of attempts, including the first call.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Policy for job submission: 2s base, 30s cap, 5 attempts.
    pub const SUBMISSION: RetryPolicy = RetryPolicy {
        base_delay_ms: 2_000,
        max_delay_ms: 30_000,
        max_attempts: 5,
    };

    /// Policy for reading the status record once the job finished: 2 attempts.
    pub const STATUS_WAIT: RetryPolicy = RetryPolicy {
        base_delay_ms: 2_000,
        max_delay_ms: 30_000,
        max_attempts: 2,
    };

    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// All delays this policy will sleep through before giving up.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.attempts()).map(|attempt| self.delay_after(attempt))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::SUBMISSION
    }
}

/// Runs `op` until it succeeds or the policy's attempts are exhausted.
///
/// Any error triggers a retry. After the last attempt the final error is
/// returned unchanged.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_delays_double_and_cap() {
        let delays: Vec<u64> = RetryPolicy::SUBMISSION
            .delays()
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![2, 4, 8, 16]);

        let long = RetryPolicy {
            max_attempts: 8,
            ..RetryPolicy::SUBMISSION
        };
        let delays: Vec<Duration> = long.delays().collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= Duration::from_secs(30)));
        assert_eq!(delays.last(), Some(&Duration::from_secs(30)));
    }

    #[test]
    fn test_status_wait_has_single_delay() {
        let delays: Vec<Duration> = RetryPolicy::STATUS_WAIT.delays().collect();
        assert_eq!(delays, vec![Duration::from_secs(2)]);
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let policy = RetryPolicy::SUBMISSION;
        assert_eq!(policy.delay_after(200), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_calls_exactly_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = tokio::time::Instant::now();

        let result: Result<(), String> = with_retry(&RetryPolicy::SUBMISSION, "always-fails", || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {}", n))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(result.unwrap_err(), "failure 5");
        assert_eq!(start.elapsed(), Duration::from_secs(2 + 4 + 8 + 16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<u32, String> = with_retry(&RetryPolicy::SUBMISSION, "flaky", || {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err("not yet".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        let n = assert_ok!(result);
        assert_eq!(n, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::STATUS_WAIT
        };

        let result: Result<(), &str> = with_retry(&policy, "once", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            }
        })
        .await;

        assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

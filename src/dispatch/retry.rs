//! Retry with linear backoff and jitter
//!
//! One utility shared by both dispatch modes. The delay before retry `k`
//! (1-based count of failed attempts) is `base_delay * k + jitter`. Nothing
//! is slept before the first attempt, and a non-retryable error ends the loop
//! immediately.

use crate::error::AttemptError;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that know whether another attempt could help
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for AttemptError {
    fn is_retryable(&self) -> bool {
        AttemptError::is_retryable(self)
    }
}

/// Attempt budget and backoff shape for one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Backoff base
    pub base_delay: Duration,
    /// Upper bound of random jitter added to each delay
    pub jitter_max: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, jitter_max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            jitter_max,
        }
    }

    /// Delay before the retry that follows failed attempt `failed`
    pub fn delay_after(&self, failed: u32, jitter: Duration) -> Duration {
        self.base_delay.saturating_mul(failed) + jitter
    }

    /// Worst-case time spent sleeping between attempts
    pub fn max_total_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .map(|k| self.delay_after(k, self.jitter_max))
            .sum()
    }
}

/// Uniform random jitter in `[0, max]`
pub fn random_jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// Run `attempt_fn` until it succeeds, returns a non-retryable error, or the
/// attempt budget is spent. Returns the success value or the last error.
///
/// `attempt_fn` receives the 1-based attempt number; `jitter_fn` is asked for
/// a jitter value before every backoff sleep.
pub async fn retry_with_backoff<T, E, F, Fut, J>(
    policy: &RetryPolicy,
    mut attempt_fn: F,
    mut jitter_fn: J,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
    J: FnMut() -> Duration,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                tracing::debug!("Attempt {}/{} failed, not retrying: {}", attempt, max_attempts, e);
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                tracing::debug!("Attempt {}/{} failed, giving up: {}", attempt, max_attempts, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_after(attempt, jitter_fn());
                tracing::debug!(
                    "Attempt {}/{} failed: {} (retrying in {:?})",
                    attempt,
                    max_attempts,
                    e,
                    delay
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
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn no_jitter() -> Duration {
        Duration::ZERO
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_kth_attempt_with_increasing_delays() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), Duration::ZERO);
        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let recorded = calls.clone();
        let result: Result<&str, AttemptError> = retry_with_backoff(
            &policy,
            move |attempt| {
                let recorded = recorded.clone();
                async move {
                    recorded.lock().push(Instant::now());
                    if attempt < 3 {
                        Err(AttemptError::Server(503))
                    } else {
                        Ok("done")
                    }
                }
            },
            no_jitter,
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        let calls = calls.lock();
        assert_eq!(calls.len(), 3);

        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps, vec![Duration::from_millis(100), Duration::from_millis(200)]);
        assert!(gaps[0] < gaps[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_when_exhausted() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::ZERO);
        let mut seen = 0;

        let result: Result<(), AttemptError> = retry_with_backoff(
            &policy,
            |attempt| {
                seen += 1;
                async move { Err(AttemptError::Network(format!("attempt {}", attempt))) }
            },
            no_jitter,
        )
        .await;

        assert_eq!(seen, 3);
        assert_eq!(result, Err(AttemptError::Network("attempt 3".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10), Duration::ZERO);
        let mut seen = 0;
        let start = Instant::now();

        let result: Result<(), AttemptError> = retry_with_backoff(
            &policy,
            |_| {
                seen += 1;
                async { Err(AttemptError::Client(400)) }
            },
            no_jitter,
        )
        .await;

        assert_eq!(seen, 1);
        assert_eq!(result, Err(AttemptError::Client(400)));
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_only_between_retries() {
        let policy = RetryPolicy::new(2, Duration::from_millis(100), Duration::from_millis(50));
        let mut jitter_calls = 0;
        let start = Instant::now();

        let result: Result<u32, AttemptError> = retry_with_backoff(
            &policy,
            |attempt| async move {
                if attempt == 1 {
                    Err(AttemptError::Timeout(10))
                } else {
                    Ok(attempt)
                }
            },
            || {
                jitter_calls += 1;
                Duration::from_millis(50)
            },
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(jitter_calls, 1);
        assert_eq!(Instant::now() - start, Duration::from_millis(150));
    }

    #[test]
    fn test_policy_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_millis(1000));
        // 100 + 1000, then 200 + 1000
        assert_eq!(policy.max_total_backoff(), Duration::from_millis(2300));

        let single = RetryPolicy::new(0, Duration::from_millis(100), Duration::ZERO);
        assert_eq!(single.max_attempts, 1);
        assert_eq!(single.max_total_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_random_jitter_in_range() {
        assert_eq!(random_jitter(Duration::ZERO), Duration::ZERO);
        for _ in 0..100 {
            assert!(random_jitter(Duration::from_millis(1000)) <= Duration::from_millis(1000));
        }
    }
}

//! Retry with exponential backoff for calls to external services.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy. The delay doubles per attempt up to `max_delay`.
#[derive(Clone, Debug)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.initial_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, returning the last error once attempts are
/// exhausted or a non-retryable error is seen.
pub async fn retry<F, Fut, T, E>(
    policy: &Backoff,
    mut op: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= policy.max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = policy.max_attempts,
                    ?delay,
                    "retrying after failure"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Whether an HTTP status is worth retrying.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_doubles_and_caps() {
        let policy = Backoff {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for(10), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result = retry(
            &Backoff::default(),
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient")
                } else {
                    Ok(7)
                }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: Result<(), &str> = retry(
            &Backoff::default(),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("fatal")
            },
            |_| false,
        )
        .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_on_persistent_failure() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: Result<(), &str> = retry(
            &Backoff::default(),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("still down")
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Err("still down"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retryable_status_classification() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(408));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
        assert!(!is_retryable_status(404));
    }
}

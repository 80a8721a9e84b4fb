use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use crate::error::FailureKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }
}

/// Failure kinds decide their own back-off; `None` stops retrying immediately.
pub trait RetryableFailure: Display {
    fn retry_delay(&self, attempt: u32, base: Duration) -> Option<Duration>;
}

impl RetryableFailure for FailureKind {
    fn retry_delay(&self, attempt: u32, base: Duration) -> Option<Duration> {
        match self {
            // 2s, 4s, 8s ... for a 2s base
            FailureKind::RateLimited => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                Some(base.saturating_mul(factor))
            }
            FailureKind::Timeout | FailureKind::InvalidLabel(_) => Some(base),
            FailureKind::Unrecoverable(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `op` until it succeeds, the failure is not retryable, or the attempt cap is hit.
/// `op` receives the 1-based attempt number. Returns the value and the attempts used.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<(T, u32), RetryExhausted<E>>
where
    E: RetryableFailure,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(failure) => {
                if attempt >= policy.max_attempts {
                    return Err(RetryExhausted { attempts: attempt, last: failure });
                }
                let Some(delay) = failure.retry_delay(attempt, policy.base_delay) else {
                    debug!(attempt, error = %failure, "Failure is not retryable");
                    return Err(RetryExhausted { attempts: attempt, last: failure });
                };
                warn!(
                    operation = "retry_backoff",
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "Attempt failed, backing off"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn test_backoff_schedule_per_kind() {
        let base = Duration::from_secs(2);
        assert_eq!(FailureKind::RateLimited.retry_delay(1, base), Some(Duration::from_secs(2)));
        assert_eq!(FailureKind::RateLimited.retry_delay(2, base), Some(Duration::from_secs(4)));
        assert_eq!(FailureKind::Timeout.retry_delay(2, base), Some(Duration::from_secs(2)));
        assert_eq!(FailureKind::InvalidLabel("meh".into()).retry_delay(1, base), Some(base));
        assert_eq!(FailureKind::Unrecoverable("401".into()).retry_delay(1, base), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let calls = Mutex::new(0u32);
        let start = Instant::now();

        let result = retry_with_backoff(&policy, |attempt| {
            *calls.lock().unwrap() += 1;
            async move {
                if attempt < 3 {
                    Err(FailureKind::RateLimited)
                } else {
                    Ok("positive")
                }
            }
        })
        .await;

        assert_eq!(result, Ok(("positive", 3)));
        assert_eq!(*calls.lock().unwrap(), 3);
        // 2s + 4s of exponential back-off
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_attempt_cap() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let start = Instant::now();

        let result: Result<((), u32), _> =
            retry_with_backoff(&policy, |_| async { Err(FailureKind::Timeout) }).await;

        assert_eq!(result, Err(RetryExhausted { attempts: 3, last: FailureKind::Timeout }));
        // No sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecoverable_stops_immediately() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let result: Result<((), u32), _> = retry_with_backoff(&policy, |_| async {
            Err(FailureKind::Unrecoverable("401 Unauthorized".to_string()))
        })
        .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 1);
    }
}

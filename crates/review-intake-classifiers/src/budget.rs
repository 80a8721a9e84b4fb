use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::warn;
use crate::error::ClassifierError;

/// Process-wide sliding-window budget for upstream classifier calls.
///
/// Shared by every request; the window is a read-modify-write critical section
/// and is only touched under the mutex.
pub struct CallBudget {
    calls: Mutex<VecDeque<Instant>>,
    limit: usize,
    window: Duration,
    wait: Duration,
}

impl CallBudget {
    pub fn new(limit: usize, window: Duration, wait: Duration) -> Self {
        Self {
            calls: Mutex::new(VecDeque::with_capacity(limit)),
            limit,
            window,
            wait,
        }
    }

    /// Record a call if the window has room
    pub async fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut calls = self.calls.lock().await;
        while let Some(oldest) = calls.front() {
            if now.duration_since(*oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
        if calls.len() >= self.limit {
            return false;
        }
        calls.push_back(now);
        true
    }

    /// Check once, wait once, check again; a second refusal is an error for the caller.
    pub async fn acquire(&self) -> Result<(), ClassifierError> {
        if self.try_acquire().await {
            return Ok(());
        }

        warn!(
            operation = "classifier_budget_wait",
            limit = self.limit,
            wait_ms = self.wait.as_millis() as u64,
            "Classifier call budget reached, waiting before re-checking"
        );
        sleep(self.wait).await;

        if self.try_acquire().await {
            Ok(())
        } else {
            Err(ClassifierError::BudgetExhausted {
                limit: self.limit,
                window: self.window,
            })
        }
    }

    pub async fn in_flight(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_budget_refuses_past_limit() {
        let budget = CallBudget::new(2, Duration::from_secs(60), Duration::from_secs(5));
        assert!(budget.try_acquire().await);
        assert!(budget.try_acquire().await);
        assert!(!budget.try_acquire().await);
        assert_eq!(budget.in_flight().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_once_then_fails() {
        let budget = CallBudget::new(1, Duration::from_secs(60), Duration::from_secs(5));
        budget.acquire().await.unwrap();

        let start = Instant::now();
        let err = budget.acquire().await.unwrap_err();
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(
            err,
            ClassifierError::BudgetExhausted { limit: 1, window: Duration::from_secs(60) }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_succeeds_when_window_frees_during_wait() {
        let budget = CallBudget::new(1, Duration::from_secs(3), Duration::from_secs(5));
        budget.acquire().await.unwrap();
        // The only call ages out of the 3s window during the 5s wait
        assert!(budget.acquire().await.is_ok());
    }
}

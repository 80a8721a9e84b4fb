use review_intake_config::RateLimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use crate::clock::{Clock, SystemClock};

struct Windows {
    by_client: HashMap<String, VecDeque<Instant>>,
    last_compaction: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactionStats {
    pub pruned_timestamps: usize,
    pub dropped_clients: usize,
    pub remaining_clients: usize,
}

/// Sliding-window admission per client address.
///
/// Each window is read, pruned and appended to as one critical section under
/// the mutex, so concurrent requests for the same key cannot both slip in.
pub struct RateLimiter {
    windows: Mutex<Windows>,
    max_requests: usize,
    window: Duration,
    cleanup_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration, cleanup_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            windows: Mutex::new(Windows {
                by_client: HashMap::new(),
                last_compaction: now,
            }),
            max_requests,
            window,
            cleanup_interval,
            clock,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.max_requests_per_window,
            Duration::from_secs(config.window_seconds),
            Duration::from_secs(config.cleanup_interval_seconds),
            clock,
        )
    }

    pub fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    /// Admission check against the injected clock
    pub async fn check(&self, client_key: &str) -> bool {
        self.admit(client_key, self.clock.now()).await
    }

    /// Admit and record `now` if fewer than `max_requests` fall inside the trailing window.
    /// A refused request is not recorded.
    pub async fn admit(&self, client_key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().await;
        let window = self.window;
        let timestamps = windows.by_client.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.saturating_duration_since(*t) < window);

        if timestamps.len() >= self.max_requests {
            debug!(client = client_key, in_window = timestamps.len(), "Client over rate limit");
            return false;
        }
        timestamps.push_back(now);
        true
    }

    /// Prune every window and drop clients left with nothing in it
    pub async fn compact(&self, now: Instant) -> CompactionStats {
        let mut windows = self.windows.lock().await;
        let window = self.window;
        let mut stats = CompactionStats::default();

        windows.by_client.retain(|_, timestamps| {
            let before = timestamps.len();
            timestamps.retain(|t| now.saturating_duration_since(*t) < window);
            stats.pruned_timestamps += before - timestamps.len();
            if timestamps.is_empty() {
                stats.dropped_clients += 1;
                false
            } else {
                true
            }
        });
        windows.last_compaction = now;
        stats.remaining_clients = windows.by_client.len();
        stats
    }

    /// Compact only if `cleanup_interval` has passed since the last compaction
    pub async fn maybe_compact(&self, now: Instant) -> Option<CompactionStats> {
        let due = {
            let windows = self.windows.lock().await;
            now.saturating_duration_since(windows.last_compaction) >= self.cleanup_interval
        };
        if due {
            Some(self.compact(now).await)
        } else {
            None
        }
    }

    pub async fn compact_now(&self) -> CompactionStats {
        self.compact(self.clock.now()).await
    }

    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.by_client.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(clock: Arc<ManualClock>) -> RateLimiter {
        RateLimiter::with_clock(&RateLimitConfig::default(), clock)
    }

    #[tokio::test]
    async fn test_sixth_request_within_window_is_refused() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(clock.clone());

        for _ in 0..5 {
            assert!(limiter.check("203.0.113.7").await);
            clock.advance(Duration::from_millis(100));
        }
        assert!(!limiter.check("203.0.113.7").await);

        clock.advance(Duration::from_secs(60));
        assert!(limiter.check("203.0.113.7").await);
    }

    #[tokio::test]
    async fn test_refusals_are_not_recorded() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(clock.clone());
        let t0 = clock.now();

        for _ in 0..5 {
            assert!(limiter.admit("a", t0).await);
        }
        // Refused attempts at 30s must not extend the window
        assert!(!limiter.admit("a", t0 + Duration::from_secs(30)).await);
        assert!(limiter.admit("a", t0 + Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(clock.clone());
        for _ in 0..5 {
            assert!(limiter.check("a").await);
        }
        assert!(!limiter.check("a").await);
        assert!(limiter.check("b").await);
    }

    #[tokio::test]
    async fn test_compaction_drops_idle_clients() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(clock.clone());
        assert!(limiter.check("old").await);
        clock.advance(Duration::from_secs(45));
        assert!(limiter.check("recent").await);
        clock.advance(Duration::from_secs(20));

        let stats = limiter.compact_now().await;
        assert_eq!(
            stats,
            CompactionStats { pruned_timestamps: 1, dropped_clients: 1, remaining_clients: 1 }
        );
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn test_maybe_compact_respects_interval() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(clock.clone());
        assert!(limiter.check("a").await);

        clock.advance(Duration::from_secs(299));
        assert!(limiter.maybe_compact(clock.now()).await.is_none());
        clock.advance(Duration::from_secs(1));
        let stats = limiter.maybe_compact(clock.now()).await.unwrap();
        assert_eq!(stats.dropped_clients, 1);
        // Interval restarts from the compaction just performed
        assert!(limiter.maybe_compact(clock.now()).await.is_none());
    }
}

//! Clock abstraction so cooldown timing is testable
//!
//! `SystemClock` delegates to `tokio::time`; `MockClock` only moves when a
//! test calls `advance()`, and its `sleep()` returns immediately.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::time::{Duration, Instant};

/// Source of monotonic time for deadline arithmetic
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Wait out `duration` (mock implementations return at once).
    /// The future is `Send` so expiry work can run on a spawned task.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Live clock backed by tokio time
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test clock pinned at construction time; `now()` moves only via `advance()`
#[derive(Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Move the clock forward; every clone observes the new time
    pub fn advance(&self, duration: Duration) {
        *self.current.lock().unwrap() += duration;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap()
    }

    async fn sleep(&self, _duration: Duration) {
        // no real waiting in tests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_advances_on_demand() {
        let clock = MockClock::new();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(30));
        assert_eq!(clock.now(), start + Duration::from_secs(30));
    }

    #[test]
    fn test_mock_clock_clones_share_time() {
        let clock = MockClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_secs(5));
        assert_eq!(other.now(), clock.now());
    }

    #[tokio::test]
    async fn test_mock_sleep_returns_immediately() {
        let clock = MockClock::new();
        let before = Instant::now();
        clock.sleep(Duration::from_secs(3600)).await;
        assert!(before.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}

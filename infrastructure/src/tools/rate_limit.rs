//! Sliding-window rate limiter for remote tool APIs

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Allows at most `max_calls` within any `window`.
///
/// [`acquire`](Self::acquire) waits for a free slot instead of failing, so
/// a burst of model requests is spread out rather than rejected.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    pub fn per_minute(max_calls: usize) -> Self {
        Self::new(max_calls, Duration::from_secs(60))
    }

    /// Take a slot if one is free right now; otherwise how long until one is.
    fn try_take(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut calls = self.calls.lock();
        while calls
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.window)
        {
            calls.pop_front();
        }

        if calls.len() < self.max_calls {
            calls.push_back(now);
            return Ok(());
        }
        let oldest = calls.front().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.duration_since(oldest)))
    }

    pub fn try_acquire(&self) -> bool {
        self.try_take().is_ok()
    }

    /// Wait until a slot is free and take it.
    pub async fn acquire(&self) {
        loop {
            match self.try_take() {
                Ok(()) => return,
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_within_window() {
        let limiter = RateLimiter::per_minute(2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}

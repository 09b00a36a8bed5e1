use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

/// Fixed-window limiter keyed by client.
///
/// Rejected requests still count toward the window, so a client that keeps
/// hammering stays rejected until the window rolls over. Entries are never
/// removed on the request path; [`RateLimiter::prune_stale`] is the hook for
/// bounding memory across many distinct clients.
pub struct RateLimiter {
    windows: DashMap<String, RateLimitEntry>,
    max_per_window: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_per_window,
            window,
        }
    }

    pub fn admit(&self, client_key: &str) -> Admission {
        let now = Instant::now();

        let mut entry = self
            .windows
            .entry(client_key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_start: now,
            });

        // window expired..? reset it
        if now.duration_since(entry.window_start) > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count <= self.max_per_window {
            Admission::Admitted
        } else {
            Admission::Rejected
        }
    }

    /// Forgets clients whose window has already elapsed, returns how many.
    pub fn prune_stale(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, entry| now.duration_since(entry.window_start) <= self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(3600);

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(3, WINDOW);

        for _ in 0..3 {
            assert_eq!(limiter.admit("10.0.0.1"), Admission::Admitted);
        }
        assert_eq!(limiter.admit("10.0.0.1"), Admission::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_independent() {
        let limiter = RateLimiter::new(1, WINDOW);

        assert_eq!(limiter.admit("a"), Admission::Admitted);
        assert_eq!(limiter.admit("a"), Admission::Rejected);
        assert_eq!(limiter.admit("b"), Admission::Admitted);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_elapsed() {
        let limiter = RateLimiter::new(2, WINDOW);
        limiter.admit("a");
        limiter.admit("a");
        assert_eq!(limiter.admit("a"), Admission::Rejected);

        // exactly one window later is still the same window
        tokio::time::advance(WINDOW).await;
        assert_eq!(limiter.admit("a"), Admission::Rejected);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(limiter.admit("a"), Admission::Admitted);
        assert_eq!(limiter.admit("a"), Admission::Admitted);
        assert_eq!(limiter.admit("a"), Admission::Rejected);
    }

    #[tokio::test(start_paused = true)]
    async fn rejections_keep_counting() {
        let limiter = RateLimiter::new(1, WINDOW);
        for _ in 0..5 {
            limiter.admit("a");
        }
        let count = limiter.windows.get("a").map(|e| e.count);
        assert_eq!(count, Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_only_elapsed_windows() {
        let limiter = RateLimiter::new(10, WINDOW);
        limiter.admit("old");
        tokio::time::advance(WINDOW / 2).await;
        limiter.admit("new");
        tokio::time::advance(WINDOW / 2 + Duration::from_secs(1)).await;

        assert_eq!(limiter.prune_stale(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.windows.contains_key("new"));
    }
}

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Caps the number of requests admitted within a trailing time window
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window: Duration,
    max_requests: usize,
    admitted: VecDeque<Instant>,
}

impl SlidingWindow {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            admitted: VecDeque::with_capacity(max_requests.min(1024)),
        }
    }

    /// Drops timestamps older than the window
    fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) > self.window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admits a request at `now` if fewer than `max_requests` fall within the window
    pub fn try_add(&mut self, now: Instant) -> bool {
        self.evict(now);
        if self.admitted.len() < self.max_requests {
            self.admitted.push_back(now);
            true
        } else {
            false
        }
    }

    /// Requests currently counted against the window
    pub fn len(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.admitted.len()
    }

    pub fn is_empty(&mut self, now: Instant) -> bool {
        self.len(now) == 0
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }
}

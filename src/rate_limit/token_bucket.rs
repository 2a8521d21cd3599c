use super::config::RateLimitConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Consecutive successes needed before the delay is relaxed
pub const SUCCESS_STREAK_THRESHOLD: u32 = 5;

/// Token bucket for one (site, class) pair whose delay adapts to outcomes
///
/// Tokens refill continuously at `requests_per_second` up to `burst_size`. When the
/// bucket is empty callers wait `current_delay`, which grows on failure and shrinks
/// after a streak of successes, always staying within `[min_delay, max_delay]`.
#[derive(Debug, Clone)]
pub struct AdaptiveTokenBucket {
    config: RateLimitConfig,

    tokens: f64,

    last_refill: Instant,

    current_delay: Duration,

    success_streak: u32,

    failure_count: u32,
}

impl AdaptiveTokenBucket {
    /// Creates a full bucket with `current_delay = min_delay`
    pub fn new(config: RateLimitConfig, now: Instant) -> Self {
        Self {
            config,
            tokens: config.burst_size as f64,
            last_refill: now,
            current_delay: config.min_delay,
            success_streak: 0,
            failure_count: 0,
        }
    }

    fn capacity(&self) -> f64 {
        self.config.burst_size as f64
    }

    /// Adds the tokens accrued since the last refill, capped at capacity
    pub fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens =
            (self.tokens + elapsed * self.config.requests_per_second).min(self.capacity());
        self.last_refill = now;
    }

    /// Attempts to take one token
    ///
    /// # Arguments
    ///
    /// * `now` - The current time instant, used to refill first
    ///
    /// # Returns
    ///
    /// * `true` - A token was consumed and the request may proceed
    /// * `false` - The bucket is empty, wait [`Self::current_delay`] and try again
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Records a successful request
    ///
    /// Every [`SUCCESS_STREAK_THRESHOLD`] consecutive successes divide the delay by
    /// the backoff factor, never going below `min_delay`.
    pub fn on_success(&mut self) {
        self.failure_count = 0;
        self.success_streak += 1;

        if self.success_streak >= SUCCESS_STREAK_THRESHOLD {
            self.current_delay = self
                .current_delay
                .div_f64(self.config.backoff_factor)
                .max(self.config.min_delay);
            self.success_streak = 0;
        }
    }

    /// Records a failed request, multiplying the delay by the backoff factor up to
    /// `max_delay`
    pub fn on_failure(&mut self) {
        self.success_streak = 0;
        self.failure_count += 1;

        let grown = self
            .current_delay
            .as_secs_f64()
            * self.config.backoff_factor;
        self.current_delay = Duration::try_from_secs_f64(grown)
            .unwrap_or(self.config.max_delay)
            .min(self.config.max_delay);
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn success_streak(&self) -> u32 {
        self.success_streak
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: 2.0,
            burst_size: 3,
            backoff_factor: 2.0,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
        }
    }

    #[test]
    fn test_new_bucket_is_full() {
        let now = Instant::now();
        let bucket = AdaptiveTokenBucket::new(create_test_config(), now);

        assert_eq!(bucket.tokens(), 3.0);
        assert_eq!(bucket.current_delay(), Duration::from_millis(500));
        assert_eq!(bucket.success_streak(), 0);
        assert_eq!(bucket.failure_count(), 0);
    }

    #[test]
    fn test_consume_until_empty() {
        let now = Instant::now();
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), now);

        assert!(bucket.try_consume(now));
        assert!(bucket.try_consume(now));
        assert!(bucket.try_consume(now));
        assert!(!bucket.try_consume(now));
    }

    #[test]
    fn test_refill_over_time() {
        let now = Instant::now();
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), now);
        for _ in 0..3 {
            assert!(bucket.try_consume(now));
        }

        // 2 rps: half a second yields one token
        let later = now + Duration::from_millis(500);
        assert!(bucket.try_consume(later));
        assert!(!bucket.try_consume(later));
    }

    #[test]
    fn test_refill_capped_at_burst() {
        let now = Instant::now();
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), now);
        assert!(bucket.try_consume(now));

        bucket.refill(now + Duration::from_secs(60));
        assert_eq!(bucket.tokens(), 3.0);
    }

    #[test]
    fn test_tokens_never_negative() {
        let now = Instant::now();
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), now);
        for _ in 0..10 {
            bucket.try_consume(now);
        }
        assert!(bucket.tokens() >= 0.0);
    }

    #[test]
    fn test_failure_doubles_delay_up_to_max() {
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), Instant::now());

        bucket.on_failure();
        assert_eq!(bucket.current_delay(), Duration::from_secs(1));
        bucket.on_failure();
        assert_eq!(bucket.current_delay(), Duration::from_secs(2));
        bucket.on_failure();
        assert_eq!(bucket.current_delay(), Duration::from_secs(4));
        bucket.on_failure();
        assert_eq!(bucket.current_delay(), Duration::from_secs(4));
        assert_eq!(bucket.failure_count(), 4);
    }

    #[test]
    fn test_success_streak_relaxes_delay() {
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), Instant::now());
        bucket.on_failure();
        bucket.on_failure();
        assert_eq!(bucket.current_delay(), Duration::from_secs(2));

        for _ in 0..4 {
            bucket.on_success();
        }
        assert_eq!(bucket.current_delay(), Duration::from_secs(2));
        assert_eq!(bucket.success_streak(), 4);

        bucket.on_success();
        assert_eq!(bucket.current_delay(), Duration::from_secs(1));
        assert_eq!(bucket.success_streak(), 0);
    }

    #[test]
    fn test_delay_never_below_min() {
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), Instant::now());
        for _ in 0..50 {
            bucket.on_success();
        }
        assert_eq!(bucket.current_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_failure_resets_success_streak() {
        let mut bucket = AdaptiveTokenBucket::new(create_test_config(), Instant::now());
        for _ in 0..4 {
            bucket.on_success();
        }
        bucket.on_failure();
        assert_eq!(bucket.success_streak(), 0);

        bucket.on_success();
        assert_eq!(bucket.failure_count(), 0);
        assert_eq!(bucket.success_streak(), 1);
    }
}

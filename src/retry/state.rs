use crate::error::CrawlError;
use std::time::Duration;

/// Bookkeeping for one retried operation
///
/// Created when the operation is first invoked and dropped once it concludes.
#[derive(Debug)]
pub struct RetryState {
    /// Failed attempts so far
    pub attempts: u32,

    pub max_attempts: u32,

    pub base_delay: Duration,

    /// Most recent retriable failure
    pub last_error: Option<CrawlError>,
}

impl RetryState {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
            last_error: None,
        }
    }

    /// Returns true while the attempt budget is not exhausted
    pub fn should_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Backoff before the next attempt, `base * 2^attempts` with jitter
    pub fn next_delay(&self, jitter: f64) -> Duration {
        calculate_delay(self.base_delay, self.attempts, jitter)
    }
}

/// Computes exponential backoff: `base * 2^attempt`, scaled by a uniform factor in
/// `[1 - jitter, 1 + jitter]`
pub fn calculate_delay(base: Duration, attempt: u32, jitter: f64) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let delay = base.as_secs_f64() * 2f64.powi(exponent);

    let factor = if jitter > 0.0 {
        1.0 + (fastrand::f64() * 2.0 - 1.0) * jitter
    } else {
        1.0
    };

    Duration::try_from_secs_f64(delay * factor).unwrap_or(Duration::MAX)
}

use crate::error::{CrawlError, ErrorFamily, RetryScope};
use std::time::Duration;

/// Default jitter ratio applied to computed backoff delays
pub const DEFAULT_JITTER: f64 = 0.1;

/// Describes how an operation should be retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay that is doubled for every failed attempt
    pub base_delay: Duration,

    /// Errors outside these families propagate without classification
    pub eligible: Vec<ErrorFamily>,

    /// Scope passed to the classifier
    pub scope: RetryScope,

    /// Uniform jitter ratio, delays land in `[d*(1-j), d*(1+j)]`
    pub jitter: f64,
}

impl RetryPolicy {
    /// Creates a policy that considers every error kind at element scope
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            eligible: vec![ErrorFamily::Any],
            scope: RetryScope::Element,
            jitter: DEFAULT_JITTER,
        }
    }

    /// Policy for loading the crawl target
    pub fn navigation() -> Self {
        Self::new(3, Duration::from_secs(2))
            .with_eligible(&[
                ErrorFamily::Network,
                ErrorFamily::Timeout,
                ErrorFamily::Navigation,
            ])
            .with_scope(RetryScope::Operation)
    }

    /// Policy for element queries and record extraction
    pub fn extraction() -> Self {
        Self::new(3, Duration::from_secs(1)).with_eligible(&[
            ErrorFamily::Network,
            ErrorFamily::Timeout,
            ErrorFamily::StaleElement,
        ])
    }

    pub fn with_eligible(mut self, families: &[ErrorFamily]) -> Self {
        self.eligible = families.to_vec();
        self
    }

    pub fn with_scope(mut self, scope: RetryScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns true if the error should go through classification at all
    pub fn is_eligible(&self, error: &CrawlError) -> bool {
        self.eligible.iter().any(|family| error.belongs_to(*family))
    }
}

//! Adaptive per-site rate limiter
//!
//! Every configured site gets three token buckets, one per [`RequestClass`], derived
//! from a single base [`RateLimitConfig`], plus one sliding window that caps the
//! site's total throughput across classes.
//!
//! # Components
//!
//! - `AdaptiveTokenBucket`: continuous refill, delay that adapts to success/failure
//! - `SlidingWindow`: at most `burst_size * 60` requests per 60 seconds per site
//! - `RateLimiter`: the shared service handed to every crawl session
//!
//! Buckets are locked per (site, class) and windows per site, so sessions crawling
//! the same site from different tasks share pacing safely.

mod config;
mod sliding_window;
mod token_bucket;

pub use config::{ClassMultipliers, RateLimitConfig, RequestClass};
pub use sliding_window::SlidingWindow;
pub use token_bucket::{AdaptiveTokenBucket, SUCCESS_STREAK_THRESHOLD};

use crate::{ConfigError, ConfigResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Length of the per-site throughput window
pub const WINDOW_LENGTH: Duration = Duration::from_secs(60);

/// Poll interval while the per-site window is full
pub const WINDOW_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pacing state for one site
#[derive(Debug)]
struct SiteLimits {
    buckets: HashMap<RequestClass, Arc<Mutex<AdaptiveTokenBucket>>>,
    window: Arc<Mutex<SlidingWindow>>,
}

impl SiteLimits {
    fn new(base: &RateLimitConfig, multipliers: &ClassMultipliers, now: Instant) -> Self {
        let buckets = RequestClass::ALL
            .iter()
            .map(|class| {
                let derived = multipliers.derive(base, *class);
                (
                    *class,
                    Arc::new(Mutex::new(AdaptiveTokenBucket::new(derived, now))),
                )
            })
            .collect();

        let window_capacity = base.burst_size as usize * WINDOW_LENGTH.as_secs() as usize;

        Self {
            buckets,
            window: Arc::new(Mutex::new(SlidingWindow::new(WINDOW_LENGTH, window_capacity))),
        }
    }
}

/// Point-in-time view of one bucket, for logging and tests
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSnapshot {
    pub config: RateLimitConfig,
    pub tokens: f64,
    pub current_delay: Duration,
    pub success_streak: u32,
    pub failure_count: u32,
}

/// Shared, explicitly constructed rate limiting service
#[derive(Debug, Default)]
pub struct RateLimiter {
    multipliers: ClassMultipliers,
    sites: RwLock<HashMap<String, Arc<SiteLimits>>>,
}

impl RateLimiter {
    /// Creates a limiter with the default class multipliers and no sites
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a limiter with custom class multipliers and no sites
    ///
    /// # Returns
    ///
    /// * `Ok(RateLimiter)` - The multipliers are all positive and finite
    /// * `Err(ConfigError::Validation)` - A multiplier would derive an unusable config
    pub fn with_multipliers(multipliers: ClassMultipliers) -> ConfigResult<Self> {
        multipliers
            .check()
            .map_err(|e| ConfigError::Validation(format!("class-multipliers: {}", e)))?;

        Ok(Self {
            multipliers,
            sites: RwLock::new(HashMap::new()),
        })
    }

    /// Creates a limiter and configures every `(site, config)` pair
    ///
    /// Fails on the first invalid multiplier or site config.
    pub async fn with_sites<I, S>(multipliers: ClassMultipliers, sites: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (S, RateLimitConfig)>,
        S: Into<String>,
    {
        let limiter = Self::with_multipliers(multipliers)?;
        for (site, config) in sites {
            limiter.configure(site, config).await?;
        }
        Ok(limiter)
    }

    /// Installs fresh buckets and a fresh window for `site`
    ///
    /// Reconfiguring a site discards its previous pacing state. An invalid config is
    /// rejected and leaves any existing state for `site` untouched.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The site is configured
    /// * `Err(ConfigError::Validation)` - `config` breaks a [`RateLimitConfig`] invariant
    pub async fn configure(
        &self,
        site: impl Into<String>,
        config: RateLimitConfig,
    ) -> ConfigResult<()> {
        let site = site.into();
        config
            .check()
            .map_err(|e| ConfigError::Validation(format!("rate limit for '{}': {}", site, e)))?;

        let limits = SiteLimits::new(&config, &self.multipliers, Instant::now());

        debug!(
            "Rate limit configured for {}: {} rps, burst {}, delay {:?}..{:?}",
            site, config.requests_per_second, config.burst_size, config.min_delay, config.max_delay
        );

        self.sites.write().await.insert(site, Arc::new(limits));
        Ok(())
    }

    pub async fn is_configured(&self, site: &str) -> bool {
        self.sites.read().await.contains_key(site)
    }

    async fn site(&self, site: &str) -> Option<Arc<SiteLimits>> {
        self.sites.read().await.get(site).cloned()
    }

    async fn bucket(
        &self,
        site: &str,
        class: RequestClass,
    ) -> Option<Arc<Mutex<AdaptiveTokenBucket>>> {
        self.site(site)
            .await
            .and_then(|limits| limits.buckets.get(&class).cloned())
    }

    /// Waits until `site` may issue one request of `class`
    ///
    /// First takes a token from the class bucket, sleeping the bucket's current delay
    /// whenever it is empty, then claims a slot in the site window, polling every
    /// [`WINDOW_POLL_INTERVAL`] while it is full. Unconfigured sites pass straight
    /// through.
    ///
    /// # Returns
    ///
    /// The total time spent waiting
    pub async fn wait(&self, site: &str, class: RequestClass) -> Duration {
        let Some(limits) = self.site(site).await else {
            trace!("No rate limit configured for {}", site);
            return Duration::ZERO;
        };

        let started = Instant::now();

        if let Some(bucket) = limits.buckets.get(&class) {
            loop {
                let delay = {
                    let mut bucket = bucket.lock().await;
                    if bucket.try_consume(Instant::now()) {
                        break;
                    }
                    bucket.current_delay()
                };
                trace!("{}/{} bucket empty, sleeping {:?}", site, class, delay);
                tokio::time::sleep(delay).await;
            }
        }

        loop {
            if limits.window.lock().await.try_add(Instant::now()) {
                break;
            }
            trace!("{} window full, sleeping {:?}", site, WINDOW_POLL_INTERVAL);
            tokio::time::sleep(WINDOW_POLL_INTERVAL).await;
        }

        let waited = started.elapsed();
        if !waited.is_zero() {
            debug!("Waited {:?} for {} ({})", waited, site, class);
        }
        waited
    }

    /// Reports a successful request of `class` against `site`
    pub async fn on_success(&self, site: &str, class: RequestClass) {
        if let Some(bucket) = self.bucket(site, class).await {
            let mut bucket = bucket.lock().await;
            let before = bucket.current_delay();
            bucket.on_success();
            if bucket.current_delay() != before {
                debug!(
                    "{}/{} delay relaxed {:?} -> {:?}",
                    site,
                    class,
                    before,
                    bucket.current_delay()
                );
            }
        }
    }

    /// Reports a failed request of `class` against `site`
    pub async fn on_failure(&self, site: &str, class: RequestClass) {
        if let Some(bucket) = self.bucket(site, class).await {
            let mut bucket = bucket.lock().await;
            bucket.on_failure();
            warn!(
                "{}/{} failure #{}, delay now {:?}",
                site,
                class,
                bucket.failure_count(),
                bucket.current_delay()
            );
        }
    }

    /// Returns the current state of one bucket, if the site is configured
    pub async fn snapshot(&self, site: &str, class: RequestClass) -> Option<BucketSnapshot> {
        let bucket = self.bucket(site, class).await?;
        let mut bucket = bucket.lock().await;
        bucket.refill(Instant::now());

        Some(BucketSnapshot {
            config: *bucket.config(),
            tokens: bucket.tokens(),
            current_delay: bucket.current_delay(),
            success_streak: bucket.success_streak(),
            failure_count: bucket.failure_count(),
        })
    }

    /// Requests counted against the site window right now
    pub async fn window_usage(&self, site: &str) -> Option<(usize, usize)> {
        let limits = self.site(site).await?;
        let mut window = limits.window.lock().await;
        Some((window.len(Instant::now()), window.max_requests()))
    }
}

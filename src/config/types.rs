use crate::config::validation::to_rate_limit_config;
use crate::crawler::CrawlSettings;
use crate::rate_limit::{ClassMultipliers, RateLimitConfig};
use crate::retry::RetryPolicy;
use crate::sites::SiteId;
use crate::ConfigResult;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the harvester
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,

    pub retry: RetryConfig,

    /// Per-class adjustments to each site's base rate limit
    #[serde(rename = "class-multipliers")]
    pub class_multipliers: ClassMultipliers,

    /// Per-site rate limits overriding the built-in defaults
    #[serde(rename = "site")]
    pub sites: Vec<SiteLimitEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Timeout for loading a page (seconds)
    #[serde(rename = "navigation-timeout-secs")]
    pub navigation_timeout_secs: u64,

    /// Timeout for waiting on an element (seconds)
    #[serde(rename = "element-timeout-secs")]
    pub element_timeout_secs: u64,

    /// Directory CSV exports are written to
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Directory diagnostic captures are written to
    #[serde(rename = "screenshot-dir")]
    pub screenshot_dir: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 30,
            element_timeout_secs: 10,
            output_dir: "data/raw".to_string(),
            screenshot_dir: "screenshots".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Retry configuration shared by all policies
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Jitter ratio applied to backoff delays
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            jitter: crate::retry::DEFAULT_JITTER,
        }
    }
}

/// Base rate limit for one site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteLimitEntry {
    pub site: SiteId,

    #[serde(rename = "requests-per-second")]
    pub requests_per_second: f64,

    #[serde(rename = "burst-size")]
    pub burst_size: u32,

    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// Minimum delay (seconds)
    #[serde(rename = "min-delay")]
    pub min_delay: f64,

    /// Maximum delay (seconds)
    #[serde(rename = "max-delay")]
    pub max_delay: f64,
}

impl Config {
    /// Base rate limit for every supported site
    ///
    /// Sites without a `[[site]]` entry get [`RateLimitConfig::default`].
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<(SiteId, RateLimitConfig)>)` - One entry per supported site
    /// * `Err(ConfigError)` - A site entry holds invalid values
    pub fn site_limits(&self) -> ConfigResult<Vec<(SiteId, RateLimitConfig)>> {
        let mut limits: Vec<(SiteId, RateLimitConfig)> = SiteId::ALL
            .iter()
            .map(|site| (*site, RateLimitConfig::default()))
            .collect();

        for entry in &self.sites {
            let config = to_rate_limit_config(entry)?;
            if let Some(slot) = limits.iter_mut().find(|(site, _)| *site == entry.site) {
                slot.1 = config;
            }
        }

        Ok(limits)
    }

    /// Retry policies and timeouts for one crawl session
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            navigation_retry: RetryPolicy::navigation().with_jitter(self.retry.jitter),
            extraction_retry: RetryPolicy::extraction().with_jitter(self.retry.jitter),
            element_timeout: Duration::from_secs(self.crawler.element_timeout_secs),
        }
    }
}

impl CrawlerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

use crate::config::types::{Config, CrawlerConfig, RetryConfig, SiteLimitEntry};
use crate::rate_limit::RateLimitConfig;
use crate::ConfigError;
use std::collections::HashSet;
use std::time::Duration;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    config
        .class_multipliers
        .check()
        .map_err(|e| ConfigError::Validation(format!("class-multipliers: {}", e)))?;
    validate_site_entries(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-secs must be >= 1, got {}",
            config.navigation_timeout_secs
        )));
    }

    if config.element_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "element-timeout-secs must be >= 1, got {}",
            config.element_timeout_secs
        )));
    }

    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.screenshot_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "screenshot-dir cannot be empty".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&config.jitter) {
        return Err(ConfigError::Validation(format!(
            "jitter must be in [0, 1), got {}",
            config.jitter
        )));
    }
    Ok(())
}

/// Validates site entries and rejects duplicates
fn validate_site_entries(entries: &[SiteLimitEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.site) {
            return Err(ConfigError::Validation(format!(
                "site '{}' is configured more than once",
                entry.site
            )));
        }
        to_rate_limit_config(entry)?;
    }
    Ok(())
}

fn seconds(site_field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            site_field, value
        ))
    })
}

/// Converts a site entry into a checked rate limit config
pub fn to_rate_limit_config(entry: &SiteLimitEntry) -> Result<RateLimitConfig, ConfigError> {
    let config = RateLimitConfig {
        requests_per_second: entry.requests_per_second,
        burst_size: entry.burst_size,
        backoff_factor: entry.backoff_factor,
        min_delay: seconds("min-delay", entry.min_delay)?,
        max_delay: seconds("max-delay", entry.max_delay)?,
    };

    config
        .check()
        .map_err(|e| ConfigError::Validation(format!("site '{}': {}", entry.site, e)))?;

    Ok(config)
}

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Kind of request, each with its own pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Page loads and page transitions
    Navigation,
    /// Element lookups and extraction on the current render
    ElementQuery,
    /// Clicks, typing and other interactions
    Interaction,
}

impl RequestClass {
    pub const ALL: [RequestClass; 3] = [
        RequestClass::Navigation,
        RequestClass::ElementQuery,
        RequestClass::Interaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::ElementQuery => "element_query",
            Self::Interaction => "interaction",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base pacing for one site
///
/// Invariants (checked by [`RateLimitConfig::check`]): `0 < min_delay <= max_delay`,
/// `burst_size >= 1`, `requests_per_second > 0`, `backoff_factor >= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub burst_size: u32,
    pub backoff_factor: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 1.0,
            burst_size: 5,
            backoff_factor: 2.0,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RateLimitConfig {
    /// Verifies the invariants, returning a description of the first violation
    pub fn check(&self) -> Result<(), String> {
        if !(self.requests_per_second > 0.0) || !self.requests_per_second.is_finite() {
            return Err(format!(
                "requests_per_second must be a positive number, got {}",
                self.requests_per_second
            ));
        }

        if self.burst_size < 1 {
            return Err(format!("burst_size must be >= 1, got {}", self.burst_size));
        }

        if !(self.backoff_factor >= 1.0) || !self.backoff_factor.is_finite() {
            return Err(format!(
                "backoff_factor must be >= 1.0, got {}",
                self.backoff_factor
            ));
        }

        if self.min_delay.is_zero() {
            return Err("min_delay must be greater than zero".to_string());
        }

        if self.min_delay > self.max_delay {
            return Err(format!(
                "min_delay ({:?}) must not exceed max_delay ({:?})",
                self.min_delay, self.max_delay
            ));
        }

        Ok(())
    }
}

/// Per-class adjustments applied to a site's base config
///
/// The defaults are tuned values rather than structural requirements, so they are
/// exposed through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClassMultipliers {
    pub navigation_rate: f64,
    pub navigation_burst: f64,
    pub navigation_min_delay: f64,
    pub element_query_rate: f64,
    pub interaction_min_delay: f64,
}

impl Default for ClassMultipliers {
    fn default() -> Self {
        Self {
            navigation_rate: 0.5,
            navigation_burst: 0.5,
            navigation_min_delay: 2.0,
            element_query_rate: 1.5,
            interaction_min_delay: 1.5,
        }
    }
}

impl ClassMultipliers {
    /// Derives the pacing for `class` from a site's base config
    ///
    /// Navigation is stricter (lower rate, smaller burst, longer minimum delay),
    /// element queries are looser, interactions keep the base rate with a longer
    /// minimum delay. Derived minimum delays never exceed `max_delay`.
    pub fn derive(&self, base: &RateLimitConfig, class: RequestClass) -> RateLimitConfig {
        let scale_delay = |factor: f64| {
            base.min_delay
                .mul_f64(factor)
                .min(base.max_delay)
        };

        match class {
            RequestClass::Navigation => RateLimitConfig {
                requests_per_second: base.requests_per_second * self.navigation_rate,
                burst_size: ((base.burst_size as f64 * self.navigation_burst).floor() as u32)
                    .max(1),
                min_delay: scale_delay(self.navigation_min_delay),
                ..*base
            },
            RequestClass::ElementQuery => RateLimitConfig {
                requests_per_second: base.requests_per_second * self.element_query_rate,
                ..*base
            },
            RequestClass::Interaction => RateLimitConfig {
                min_delay: scale_delay(self.interaction_min_delay),
                ..*base
            },
        }
    }

    pub fn check(&self) -> Result<(), String> {
        let all = [
            ("navigation-rate", self.navigation_rate),
            ("navigation-burst", self.navigation_burst),
            ("navigation-min-delay", self.navigation_min_delay),
            ("element-query-rate", self.element_query_rate),
            ("interaction-min-delay", self.interaction_min_delay),
        ];

        for (name, value) in all {
            if !(value > 0.0) || !value.is_finite() {
                return Err(format!("{} must be a positive number, got {}", name, value));
            }
        }

        Ok(())
    }
}

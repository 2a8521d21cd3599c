//! Review Harvester: a resilient product review crawler
//!
//! This crate drives one crawl session per product page: it validates the target
//! URL, loads the page through a [`crawler::PageAgent`], extracts records page by
//! page through a site [`crawler::Extractor`], and exports what it collected.
//! Every request is paced by an adaptive, per-site [`rate_limit::RateLimiter`] and
//! transient failures are retried according to a classified [`error::CrawlError`].

pub mod agent;
pub mod config;
pub mod crawler;
pub mod error;
pub mod model;
pub mod output;
pub mod rate_limit;
pub mod retry;
pub mod sites;
pub mod state;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Crawl error: {0}")]
    Crawl(#[from] error::CrawlError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Target URL errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL is empty")]
    Empty,

    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Unsupported site: {host} (supported: {supported})")]
    UnsupportedSite { host: String, supported: String },

    #[error("Not a product page: {0}")]
    NotProductPage(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use error::{CrawlError, ErrorKind};
pub use sites::{validate_url, ProductTarget, SiteId};
pub use state::{CrawlState, PageInfo};

//! Configuration module for the review harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file) yields the defaults.
//!
//! # Example
//!
//! ```no_run
//! use review_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Element timeout: {}s", config.crawler.element_timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, RetryConfig, SiteLimitEntry, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{load_config, load_or_default, parse_config};

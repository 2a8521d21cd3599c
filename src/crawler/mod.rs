//! Crawler module for driving crawl sessions
//!
//! This module contains the core crawling logic, including:
//! - The `PageAgent` and `Extractor` capabilities a session consumes
//! - Pagination discovery and page transitions
//! - Cooperative shutdown with one-shot cleanup
//! - The orchestrator state machine that ties them together

mod extractor;
mod orchestrator;
mod page_agent;
pub mod pagination;
mod shutdown;

pub use extractor::Extractor;
pub use orchestrator::{CrawlOutcome, CrawlSettings, Orchestrator};
pub use page_agent::{ElementSnapshot, PageAgent, RenderedPage};
pub use shutdown::ShutdownHandle;

use crate::agent::HttpPageAgent;
use crate::config::Config;
use crate::model::Review;
use crate::rate_limit::RateLimiter;
use crate::sites::{ProductTarget, SiteExtractor};
use crate::Result;
use std::sync::Arc;

/// Runs a complete crawl of one product over HTTP
///
/// This is the main entry point used by the binary. It will:
/// 1. Build the HTTP page agent from the configuration
/// 2. Select the extractor for the target's site
/// 3. Register closing the agent as a shutdown cleanup action
/// 4. Run the orchestrator to a terminal state
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `limiter` - Rate limiter shared by every session in the process
/// * `shutdown` - Process-wide shutdown handle
/// * `target` - The validated product to crawl
/// * `requested_pages` - Optional page cap
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The session reached a terminal state
/// * `Err(HarvestError)` - Invalid input or the agent could not be built
pub async fn crawl(
    config: &Config,
    limiter: Arc<RateLimiter>,
    shutdown: ShutdownHandle,
    target: &ProductTarget,
    requested_pages: Option<u32>,
) -> Result<CrawlOutcome<Review>> {
    let agent = Arc::new(HttpPageAgent::new(target.site, &config.crawler)?);

    let closing = Arc::clone(&agent);
    shutdown.register_cleanup("close page agent", move || async move {
        if let Err(e) = closing.close().await {
            tracing::warn!("Failed to close page agent: {}", e);
        }
    });

    let mut orchestrator = Orchestrator::new(
        agent,
        SiteExtractor::for_site(target.site),
        limiter,
        shutdown,
    )
    .with_settings(config.crawl_settings());

    orchestrator.run(target, requested_pages).await
}

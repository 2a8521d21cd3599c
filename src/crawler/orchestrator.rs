//! Crawl orchestrator - drives one session through the crawl state machine
//!
//! This module contains the loop that coordinates one crawl session, including:
//! - Loading the target under the navigation retry policy
//! - Discovering metadata and pagination bounds
//! - Collecting records page by page, skipping malformed records
//! - Advancing pages until the cap, the last page, a failure or shutdown
//!
//! Every externally visible operation first waits on the shared rate limiter and
//! reports its outcome back to it.

use super::pagination::{discover_total_pages, go_to_page, set_page_range};
use super::{Extractor, PageAgent, RenderedPage, ShutdownHandle};
use crate::error::{CrawlContext, CrawlError};
use crate::model::ProductMetadata;
use crate::rate_limit::{RateLimiter, RequestClass};
use crate::retry::{retry_with_observer, RetryPolicy, RetryState};
use crate::sites::ProductTarget;
use crate::state::{CrawlState, PageInfo};
use crate::{HarvestError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Tunables of one crawl session
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Policy for loading the target URL
    pub navigation_retry: RetryPolicy,

    /// Policy for rendering and extracting a page
    pub extraction_retry: RetryPolicy,

    /// How long to wait for the extractor's ready selector
    pub element_timeout: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            navigation_retry: RetryPolicy::navigation(),
            extraction_retry: RetryPolicy::extraction(),
            element_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of one crawl session
#[derive(Debug)]
pub struct CrawlOutcome<R> {
    /// Terminal state, `Done` or `Failed`
    pub state: CrawlState,

    /// Collected records in page order
    pub records: Vec<R>,

    pub metadata: ProductMetadata,

    /// Pagination bounds, once discovered
    pub page_info: Option<PageInfo>,

    /// Pages whose extraction was attempted
    pub pages_visited: u32,

    /// Records dropped because they could not be parsed
    pub skipped_records: usize,

    /// The error that ended a `Failed` session
    pub error: Option<CrawlError>,
}

impl<R> CrawlOutcome<R> {
    fn new() -> Self {
        Self {
            state: CrawlState::Idle,
            records: Vec::new(),
            metadata: ProductMetadata::default(),
            page_info: None,
            pages_visited: 0,
            skipped_records: 0,
            error: None,
        }
    }

    /// Returns true when the session ended cleanly with at least one record
    pub fn is_success(&self) -> bool {
        self.state.is_success() && !self.records.is_empty()
    }

    /// Returns true when the session stopped before the pages it planned to visit
    pub fn is_partial(&self) -> bool {
        self.page_info
            .map(|info| self.pages_visited < info.pages_to_crawl())
            .unwrap_or(false)
    }
}

/// Records collected from one page
struct PageHarvest<R> {
    records: Vec<R>,
    skipped: Vec<CrawlError>,
}

/// Drives one crawl session
///
/// The agent and extractor are owned by this session; the rate limiter and the
/// shutdown handle are shared with every other session in the process.
pub struct Orchestrator<A, E> {
    agent: Arc<A>,
    extractor: E,
    limiter: Arc<RateLimiter>,
    shutdown: ShutdownHandle,
    settings: CrawlSettings,
    state: CrawlState,
}

impl<A, E> Orchestrator<A, E>
where
    A: PageAgent,
    E: Extractor,
{
    /// Creates an idle orchestrator with default settings
    ///
    /// # Arguments
    ///
    /// * `agent` - Page agent for this session
    /// * `extractor` - Extractor for the target's site
    /// * `limiter` - Rate limiter shared across sessions
    /// * `shutdown` - Process-wide shutdown handle
    pub fn new(
        agent: Arc<A>,
        extractor: E,
        limiter: Arc<RateLimiter>,
        shutdown: ShutdownHandle,
    ) -> Self {
        Self {
            agent,
            extractor,
            limiter,
            shutdown,
            settings: CrawlSettings::default(),
            state: CrawlState::Idle,
        }
    }

    pub fn with_settings(mut self, settings: CrawlSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    fn transition(&mut self, next: CrawlState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("State: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn fail<R>(
        &mut self,
        mut outcome: CrawlOutcome<R>,
        error: CrawlError,
    ) -> Result<CrawlOutcome<R>> {
        tracing::error!("Crawl failed: {}", error);
        self.transition(CrawlState::Failed)?;
        outcome.state = self.state;
        outcome.error = Some(error);
        Ok(outcome)
    }

    fn finish<R>(&mut self, mut outcome: CrawlOutcome<R>) -> Result<CrawlOutcome<R>> {
        self.transition(CrawlState::Done)?;
        outcome.state = self.state;
        tracing::info!(
            "Crawl finished: {} records from {} page(s), {} skipped",
            outcome.records.len(),
            outcome.pages_visited,
            outcome.skipped_records
        );
        Ok(outcome)
    }

    /// Runs the session to a terminal state
    ///
    /// # Arguments
    ///
    /// * `target` - The validated product to crawl
    /// * `requested_pages` - Optional page cap, at least 1
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The session reached `Done` or `Failed`; partial
    ///   results are kept in both cases
    /// * `Err(HarvestError::InvalidInput)` - `requested_pages` was zero
    /// * `Err(HarvestError::InvalidTransition)` - The orchestrator was already used
    pub async fn run(
        &mut self,
        target: &ProductTarget,
        requested_pages: Option<u32>,
    ) -> Result<CrawlOutcome<E::Record>> {
        if requested_pages == Some(0) {
            return Err(HarvestError::InvalidInput(
                "requested pages must be at least 1".to_string(),
            ));
        }

        let context = CrawlContext::new(
            target.url.as_str(),
            target.site.as_str(),
            target.product_id.as_str(),
        );
        let mut outcome = CrawlOutcome::new();

        tracing::info!(
            "Starting crawl of {} product {} ({})",
            target.site,
            target.product_id,
            target.url
        );

        // Idle -> Navigating
        self.transition(CrawlState::Navigating)?;
        if let Err(error) = self.navigate(target, &context).await {
            self.agent.screenshot("navigation_failed").await;
            return self.fail(outcome, error);
        }

        // Navigating -> CollectingPage
        self.transition(CrawlState::CollectingPage)?;
        let mut page_info = match self.render_overview(target, &context).await {
            Ok(page) => {
                outcome.metadata = self.extract_metadata(&page);
                let total = discover_total_pages(&self.extractor, &page);
                set_page_range(total, requested_pages)?
            }
            Err(error) if error.is_resource() => {
                self.agent.screenshot("overview_failed").await;
                return self.fail(outcome, error);
            }
            Err(error) => {
                tracing::warn!("Could not read product overview: {}", error);
                set_page_range(1, requested_pages)?
            }
        };
        outcome.page_info = Some(page_info);

        tracing::info!(
            "Crawling {} of {} page(s)",
            page_info.pages_to_crawl(),
            page_info.total_pages()
        );

        loop {
            let page_number = page_info.current_page();

            match self.collect_page(target, &context, page_number).await {
                Ok(harvest) => {
                    for skipped in &harvest.skipped {
                        tracing::warn!("Skipped record on page {}: {}", page_number, skipped);
                    }
                    tracing::info!(
                        "Page {}/{}: {} records",
                        page_number,
                        page_info.pages_to_crawl(),
                        harvest.records.len()
                    );
                    outcome.skipped_records += harvest.skipped.len();
                    outcome.records.extend(harvest.records);
                }
                Err(error) if error.is_resource() => {
                    outcome.pages_visited += 1;
                    self.agent
                        .screenshot(&format!("page_{}_failed", page_number))
                        .await;
                    return self.fail(outcome, error);
                }
                Err(error) => {
                    tracing::warn!("Page {} yielded no records: {}", page_number, error);
                }
            }
            outcome.pages_visited += 1;

            if page_info.is_complete() {
                return self.finish(outcome);
            }

            if self.shutdown.is_requested() {
                tracing::info!("Shutdown requested, stopping after page {}", page_number);
                return self.finish(outcome);
            }

            // CollectingPage -> Paginating
            self.transition(CrawlState::Paginating)?;
            let next = page_number + 1;
            self.limiter
                .wait(target.site.as_str(), RequestClass::Navigation)
                .await;

            match go_to_page(self.agent.as_ref(), &mut page_info, next).await {
                Ok(true) => {
                    self.limiter
                        .on_success(target.site.as_str(), RequestClass::Navigation)
                        .await;
                    outcome.page_info = Some(page_info);
                    self.transition(CrawlState::CollectingPage)?;
                }
                Ok(false) => {
                    self.limiter
                        .on_failure(target.site.as_str(), RequestClass::Navigation)
                        .await;
                    tracing::warn!(
                        "Could not move to page {}, keeping {} records",
                        next,
                        outcome.records.len()
                    );
                    return self.finish(outcome);
                }
                Err(error) => {
                    self.limiter
                        .on_failure(target.site.as_str(), RequestClass::Navigation)
                        .await;
                    let error = error.or_context(|| context.clone().with_page(next));
                    tracing::warn!(
                        "Pagination failed, keeping {} records: {}",
                        outcome.records.len(),
                        error
                    );
                    self.agent
                        .screenshot(&format!("pagination_{}_failed", next))
                        .await;
                    return self.finish(outcome);
                }
            }
        }
    }

    /// Loads the target URL under the navigation policy
    async fn navigate(
        &self,
        target: &ProductTarget,
        context: &CrawlContext,
    ) -> std::result::Result<(), CrawlError> {
        let agent = self.agent.as_ref();
        let limiter = self.limiter.as_ref();
        let site = target.site.as_str();
        let url = target.url.as_str();

        let result = retry_with_observer(
            &self.settings.navigation_retry,
            || async move {
                limiter.wait(site, RequestClass::Navigation).await;
                agent.navigate(url).await
            },
            |state| log_retry("navigation", state),
        )
        .await;

        match result {
            Ok(()) => {
                limiter.on_success(site, RequestClass::Navigation).await;
                Ok(())
            }
            Err(error) => {
                limiter.on_failure(site, RequestClass::Navigation).await;
                let error = error.or_context(|| context.clone());
                if error.is_navigation() {
                    Err(error)
                } else {
                    Err(CrawlError::navigation(format!("Failed to load {}", url))
                        .with_context(context.clone())
                        .with_source(error))
                }
            }
        }
    }

    /// Renders the first page for metadata and pagination discovery
    async fn render_overview(
        &self,
        target: &ProductTarget,
        context: &CrawlContext,
    ) -> std::result::Result<RenderedPage, CrawlError> {
        let agent = self.agent.as_ref();
        let limiter = self.limiter.as_ref();
        let site = target.site.as_str();
        let ready = self.extractor.ready_selector();
        let timeout = self.settings.element_timeout;

        let result = retry_with_observer(
            &self.settings.extraction_retry,
            || async move {
                limiter.wait(site, RequestClass::ElementQuery).await;
                if let Some(selector) = ready {
                    agent.wait_for_element(selector, timeout).await?;
                }
                agent.render().await
            },
            |state| log_retry("overview", state),
        )
        .await;

        self.report(site, RequestClass::ElementQuery, result.is_ok())
            .await;
        result.map_err(|error| error.or_context(|| context.clone().with_page(1)))
    }

    fn extract_metadata(&self, page: &RenderedPage) -> ProductMetadata {
        match self.extractor.extract_metadata(page) {
            Ok(metadata) => {
                tracing::info!(
                    "Product: {} (rating {:.1}, {} reviews)",
                    metadata.name,
                    metadata.average_rating,
                    metadata.record_count
                );
                metadata
            }
            Err(error) => {
                tracing::warn!("Could not extract product metadata: {}", error);
                ProductMetadata::default()
            }
        }
    }

    /// Renders the current page and extracts its records
    ///
    /// Parsing failures of single records are collected as skips. Any other
    /// per-record failure fails the whole attempt so the retry policy applies.
    async fn collect_page(
        &self,
        target: &ProductTarget,
        context: &CrawlContext,
        page_number: u32,
    ) -> std::result::Result<PageHarvest<E::Record>, CrawlError> {
        let agent = self.agent.as_ref();
        let limiter = self.limiter.as_ref();
        let extractor = &self.extractor;
        let site = target.site.as_str();
        let target_id = target.product_id.as_str();
        let timeout = self.settings.element_timeout;

        let result = retry_with_observer(
            &self.settings.extraction_retry,
            || async move {
                limiter.wait(site, RequestClass::ElementQuery).await;
                if let Some(selector) = extractor.ready_selector() {
                    agent.wait_for_element(selector, timeout).await?;
                }
                let page = agent.render().await?;

                let mut harvest = PageHarvest {
                    records: Vec::new(),
                    skipped: Vec::new(),
                };
                for item in extractor.extract_records(&page, target_id)? {
                    match item {
                        Ok(record) => harvest.records.push(record),
                        Err(error) if error.is_parsing() => harvest.skipped.push(error),
                        Err(error) => return Err(error),
                    }
                }
                Ok::<_, CrawlError>(harvest)
            },
            |state| log_retry("extraction", state),
        )
        .await;

        self.report(site, RequestClass::ElementQuery, result.is_ok())
            .await;

        let page_context = || context.clone().with_page(page_number);
        result
            .map(|mut harvest| {
                harvest.skipped = harvest
                    .skipped
                    .into_iter()
                    .map(|error| error.or_context(page_context))
                    .collect();
                harvest
            })
            .map_err(|error| error.or_context(page_context))
    }

    async fn report(&self, site: &str, class: RequestClass, success: bool) {
        if success {
            self.limiter.on_success(site, class).await;
        } else {
            self.limiter.on_failure(site, class).await;
        }
    }
}

fn log_retry(operation: &str, state: &RetryState) {
    if let Some(error) = &state.last_error {
        tracing::warn!(
            "Retrying {} (attempt {}/{}): {}",
            operation,
            state.attempts,
            state.max_attempts,
            error
        );
    }
}

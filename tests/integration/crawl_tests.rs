//! End-to-end orchestrator sessions
//!
//! Pages are served by a scripted agent. Each page body is a list of lines that the
//! line extractor turns into records:
//! - `ok:<id>` yields a review
//! - `missing` yields an element-not-found record error
//! - `bad` yields an invalid-data record error

use async_trait::async_trait;
use chrono::NaiveDate;
use review_harvester::crawler::{
    ElementSnapshot, Extractor, Orchestrator, PageAgent, RenderedPage, ShutdownHandle,
};
use review_harvester::error::{CrawlError, ErrorKind};
use review_harvester::model::{ProductMetadata, Review, ReviewRating};
use review_harvester::rate_limit::{RateLimitConfig, RateLimiter};
use review_harvester::sites::{validate_url, ProductTarget, SiteId};
use review_harvester::state::CrawlState;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct ScriptedAgent {
    pages: Vec<String>,
    current: Mutex<u32>,
    advances: Mutex<Vec<u32>>,
    renders: Mutex<u32>,

    /// Pages whose render fails once with a timeout
    flaky_pages: Mutex<Vec<u32>>,

    /// Page whose render fails with a resource error
    broken_page: Option<u32>,

    /// Page number `advance_page` refuses to reach
    unreachable_page: Option<u32>,

    /// Requests shutdown while this page renders
    shutdown_on_page: Option<(u32, ShutdownHandle)>,
}

impl ScriptedAgent {
    fn with_pages(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            current: Mutex::new(1),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PageAgent for ScriptedAgent {
    async fn navigate(&self, _url: &str) -> Result<(), CrawlError> {
        *self.current.lock().unwrap() = 1;
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<ElementSnapshot, CrawlError> {
        Ok(ElementSnapshot {
            html: String::new(),
            text: selector.to_string(),
        })
    }

    async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementSnapshot>, CrawlError> {
        Ok(vec![self.wait_for_element(selector, timeout).await?])
    }

    async fn current_url(&self) -> Option<String> {
        Some(format!("mock://page/{}", self.current.lock().unwrap()))
    }

    async fn advance_page(&self, page_number: u32) -> Result<bool, CrawlError> {
        self.advances.lock().unwrap().push(page_number);
        if self.unreachable_page == Some(page_number) {
            return Err(CrawlError::interaction(format!(
                "page button {} not clickable",
                page_number
            )));
        }
        *self.current.lock().unwrap() = page_number;
        Ok(true)
    }

    async fn render(&self) -> Result<RenderedPage, CrawlError> {
        *self.renders.lock().unwrap() += 1;
        let page = *self.current.lock().unwrap();

        if let Some((on_page, handle)) = &self.shutdown_on_page {
            if *on_page == page {
                handle.request();
            }
        }

        if self.broken_page == Some(page) {
            return Err(CrawlError::resource("renderer crashed"));
        }

        {
            let mut flaky = self.flaky_pages.lock().unwrap();
            if let Some(pos) = flaky.iter().position(|p| *p == page) {
                flaky.remove(pos);
                return Err(CrawlError::timeout("render timed out"));
            }
        }

        let html = self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(RenderedPage::new(format!("mock://page/{}", page), html))
    }

    async fn screenshot(&self, _label: &str) {}

    async fn close(&self) -> Result<(), CrawlError> {
        Ok(())
    }
}

struct LineExtractor {
    total_pages: u32,
}

impl Extractor for LineExtractor {
    type Record = Review;

    fn site(&self) -> SiteId {
        SiteId::Coupang
    }

    fn ready_selector(&self) -> Option<&str> {
        Some(".review")
    }

    fn extract_metadata(&self, _page: &RenderedPage) -> Result<ProductMetadata, CrawlError> {
        Ok(ProductMetadata::new("Scripted product", 4.2, 50))
    }

    fn extract_records(
        &self,
        page: &RenderedPage,
        target_id: &str,
    ) -> Result<Vec<Result<Review, CrawlError>>, CrawlError> {
        Ok(page
            .html
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line {
                "missing" => Err(CrawlError::element_not_found(".content")),
                "bad" => Err(CrawlError::invalid_data("rating", Some("x".to_string()))),
                other => Ok(review(other.trim_start_matches("ok:"), target_id)),
            })
            .collect())
    }

    fn total_pages(&self, _page: &RenderedPage) -> Option<u32> {
        Some(self.total_pages)
    }

    fn displayed_record_count(&self, _page: &RenderedPage) -> Option<u64> {
        None
    }
}

fn review(id: &str, product_id: &str) -> Review {
    Review {
        id: id.to_string(),
        product_id: product_id.to_string(),
        site: SiteId::Coupang,
        rating: ReviewRating::out_of_five(5.0),
        content: format!("review {}", id),
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        title: None,
        author: None,
        purchase_date: None,
        option_info: None,
        likes: None,
        image_urls: Vec::new(),
    }
}

fn target() -> ProductTarget {
    validate_url("https://www.coupang.com/vp/products/42").unwrap()
}

async fn create_test_limiter() -> Arc<RateLimiter> {
    let limiter = RateLimiter::new();
    limiter
        .configure("coupang", RateLimitConfig::default())
        .await
        .unwrap();
    Arc::new(limiter)
}

fn ids(records: &[Review]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

const FIVE_PAGES: [&str; 5] = [
    "ok:a1\nok:a2",
    "ok:b1\nmissing\nok:b2\nok:b3\nok:b4",
    "ok:c1",
    "ok:d1",
    "ok:e1",
];

#[tokio::test(start_paused = true)]
async fn test_requested_pages_cap_the_crawl() {
    let agent = Arc::new(ScriptedAgent::with_pages(&FIVE_PAGES));
    let mut orchestrator = Orchestrator::new(
        Arc::clone(&agent),
        LineExtractor { total_pages: 5 },
        create_test_limiter().await,
        ShutdownHandle::new(),
    );

    let outcome = orchestrator.run(&target(), Some(3)).await.unwrap();

    assert_eq!(outcome.state, CrawlState::Done);
    assert_eq!(orchestrator.state(), CrawlState::Done);
    assert_eq!(outcome.pages_visited, 3);
    assert_eq!(*agent.advances.lock().unwrap(), vec![2, 3]);
    assert_eq!(
        ids(&outcome.records),
        vec!["a1", "a2", "b1", "b2", "b3", "b4", "c1"]
    );
    assert_eq!(outcome.skipped_records, 1);
    assert_eq!(outcome.metadata.name, "Scripted product");

    let info = outcome.page_info.unwrap();
    assert_eq!(info.total_pages(), 5);
    assert_eq!(info.pages_to_crawl(), 3);
    assert_eq!(info.current_page(), 3);
    assert!(outcome.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_all_pages_when_uncapped() {
    let agent = Arc::new(ScriptedAgent::with_pages(&FIVE_PAGES));
    let mut orchestrator = Orchestrator::new(
        Arc::clone(&agent),
        LineExtractor { total_pages: 5 },
        create_test_limiter().await,
        ShutdownHandle::new(),
    );

    let outcome = orchestrator.run(&target(), None).await.unwrap();

    assert_eq!(outcome.pages_visited, 5);
    assert_eq!(outcome.records.len(), 9);
    assert_eq!(*agent.advances.lock().unwrap(), vec![2, 3, 4, 5]);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_record_is_skipped() {
    let agent = Arc::new(ScriptedAgent::with_pages(&["bad\nok:a1"]));
    let mut orchestrator = Orchestrator::new(
        agent,
        LineExtractor { total_pages: 1 },
        create_test_limiter().await,
        ShutdownHandle::new(),
    );

    let outcome = orchestrator.run(&target(), None).await.unwrap();

    assert_eq!(outcome.state, CrawlState::Done);
    assert_eq!(ids(&outcome.records), vec!["a1"]);
    assert_eq!(outcome.skipped_records, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pagination_failure_keeps_collected_pages() {
    let mut agent = ScriptedAgent::with_pages(&FIVE_PAGES);
    agent.unreachable_page = Some(3);
    let agent = Arc::new(agent);

    let mut orchestrator = Orchestrator::new(
        Arc::clone(&agent),
        LineExtractor { total_pages: 5 },
        create_test_limiter().await,
        ShutdownHandle::new(),
    );

    let outcome = orchestrator.run(&target(), None).await.unwrap();

    assert_eq!(outcome.state, CrawlState::Done);
    assert!(outcome.error.is_none());
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(
        ids(&outcome.records),
        vec!["a1", "a2", "b1", "b2", "b3", "b4"]
    );
    // pagination is not retried
    assert_eq!(*agent.advances.lock().unwrap(), vec![2, 3]);
    assert_eq!(outcome.page_info.unwrap().current_page(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_after_current_page() {
    let shutdown = ShutdownHandle::new();
    let mut agent = ScriptedAgent::with_pages(&FIVE_PAGES);
    agent.shutdown_on_page = Some((2, shutdown.clone()));
    let agent = Arc::new(agent);

    let mut orchestrator = Orchestrator::new(
        Arc::clone(&agent),
        LineExtractor { total_pages: 5 },
        create_test_limiter().await,
        shutdown.clone(),
    );

    let outcome = orchestrator.run(&target(), None).await.unwrap();

    assert!(shutdown.is_requested());
    assert_eq!(outcome.state, CrawlState::Done);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.records.len(), 6);
    assert_eq!(*agent.advances.lock().unwrap(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_resource_error_fails_session_with_partial_results() {
    let mut agent = ScriptedAgent::with_pages(&FIVE_PAGES);
    agent.broken_page = Some(2);
    let agent = Arc::new(agent);

    let mut orchestrator = Orchestrator::new(
        Arc::clone(&agent),
        LineExtractor { total_pages: 5 },
        create_test_limiter().await,
        ShutdownHandle::new(),
    );

    let outcome = orchestrator.run(&target(), None).await.unwrap();

    assert_eq!(outcome.state, CrawlState::Failed);
    assert!(outcome.is_partial());
    assert_eq!(ids(&outcome.records), vec!["a1", "a2"]);

    let error = outcome.error.unwrap();
    assert!(matches!(error.kind(), ErrorKind::Resource));
    let context = error.context().unwrap();
    assert_eq!(context.page_number, Some(2));
    assert_eq!(context.target_id, "42");
}

#[tokio::test(start_paused = true)]
async fn test_transient_render_failure_is_retried() {
    let agent = ScriptedAgent::with_pages(&FIVE_PAGES);
    agent.flaky_pages.lock().unwrap().push(3);
    let agent = Arc::new(agent);

    let mut orchestrator = Orchestrator::new(
        Arc::clone(&agent),
        LineExtractor { total_pages: 5 },
        create_test_limiter().await,
        ShutdownHandle::new(),
    );

    let outcome = orchestrator.run(&target(), Some(3)).await.unwrap();

    assert_eq!(outcome.state, CrawlState::Done);
    assert_eq!(outcome.records.len(), 7);
    // overview + page 1 + page 2 + page 3 twice
    assert_eq!(*agent.renders.lock().unwrap(), 5);
}

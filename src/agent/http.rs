//! HTTP page agent implementation
//!
//! This module drives a crawl session over plain HTTP, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Classifying transport failures and status codes into crawl errors
//! - Answering element queries against the last fetched document
//! - Moving between review pages through the site's page query parameter
//! - Writing the current document to disk as a diagnostic capture

use crate::config::CrawlerConfig;
use crate::crawler::{ElementSnapshot, PageAgent, RenderedPage};
use crate::error::CrawlError;
use crate::sites::SiteId;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use scraper::{Html, Selector};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

/// Mutable state of one session
#[derive(Debug, Default)]
struct Session {
    /// URL passed to the last successful `navigate`
    product_url: Option<Url>,

    /// Document currently "rendered"
    current: Option<RenderedPage>,

    closed: bool,
}

/// [`PageAgent`] backed by a reqwest client
///
/// Documents are static once fetched, so element waits resolve immediately against
/// the current document instead of polling.
#[derive(Debug)]
pub struct HttpPageAgent {
    site: SiteId,
    client: Client,
    screenshot_dir: PathBuf,
    session: Mutex<Session>,
}

impl HttpPageAgent {
    /// Builds an agent for `site` from the crawler configuration
    ///
    /// # Arguments
    ///
    /// * `site` - Site whose pagination scheme the agent follows
    /// * `config` - Crawler configuration (user agent, timeouts, capture directory)
    ///
    /// # Returns
    ///
    /// * `Ok(HttpPageAgent)` - Ready to navigate
    /// * `Err(HarvestError::Http)` - The HTTP client could not be built
    pub fn new(site: SiteId, config: &CrawlerConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.navigation_timeout())
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            site,
            client,
            screenshot_dir: PathBuf::from(&config.screenshot_dir),
            session: Mutex::new(Session::default()),
        })
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Fetches `url` and turns the response into a rendered page
    async fn fetch(&self, url: &str) -> Result<RenderedPage, CrawlError> {
        debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        let response = check_status(response)?;
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(classify_request_error)?;

        Ok(RenderedPage::new(final_url, body))
    }

    /// Copy of the current document's HTML
    async fn current_html(&self) -> Result<String, CrawlError> {
        let session = self.session.lock().await;
        if session.closed {
            return Err(CrawlError::page_agent("Session is closed"));
        }
        session
            .current
            .as_ref()
            .map(|page| page.html.clone())
            .ok_or_else(|| CrawlError::page_agent("No page has been loaded"))
    }
}

/// Maps a reqwest failure onto the crawl error taxonomy
pub fn classify_request_error(error: reqwest::Error) -> CrawlError {
    let crawl_error = if error.is_timeout() {
        CrawlError::timeout(format!("Request timed out: {}", error))
    } else if error.is_builder() {
        CrawlError::navigation(format!("Invalid request: {}", error))
    } else if error.is_connect() {
        CrawlError::network(format!("Connection failed: {}", error))
    } else if error.is_decode() || error.is_body() {
        CrawlError::network(format!("Failed to read response body: {}", error))
    } else {
        CrawlError::network(error.to_string())
    };

    crawl_error.with_source(error)
}

/// Rejects non-success statuses
fn check_status(response: Response) -> Result<Response, CrawlError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(CrawlError::page_not_found(format!(
            "Page not found: {}",
            response.url()
        )));
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(CrawlError::rate_limited(retry_after));
    }

    if !status.is_success() {
        return Err(CrawlError::http(status.as_u16()));
    }

    Ok(response)
}

/// Runs `selector` against `html` and snapshots every match
///
/// # Returns
///
/// * `Ok(Vec<ElementSnapshot>)` - Matches in document order, possibly empty
/// * `Err(CrawlError)` - The selector itself is invalid
pub fn select_elements(html: &str, selector: &str) -> Result<Vec<ElementSnapshot>, CrawlError> {
    let parsed = Selector::parse(selector)
        .map_err(|e| CrawlError::parsing(format!("Invalid selector '{}': {}", selector, e)))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&parsed)
        .map(|element| ElementSnapshot {
            html: element.html(),
            text: element
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect())
}

#[async_trait]
impl PageAgent for HttpPageAgent {
    async fn navigate(&self, url: &str) -> Result<(), CrawlError> {
        let parsed = Url::parse(url)
            .map_err(|e| CrawlError::navigation(format!("Invalid URL '{}': {}", url, e)))?;

        if self.session.lock().await.closed {
            return Err(CrawlError::page_agent("Session is closed"));
        }

        let page = self.fetch(parsed.as_str()).await?;

        let mut session = self.session.lock().await;
        session.product_url = Some(parsed);
        session.current = Some(page);
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<ElementSnapshot, CrawlError> {
        let html = self.current_html().await?;
        select_elements(&html, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| CrawlError::element_not_found(selector))
    }

    async fn wait_for_elements(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Vec<ElementSnapshot>, CrawlError> {
        let html = self.current_html().await?;
        let elements = select_elements(&html, selector)?;
        if elements.is_empty() {
            return Err(CrawlError::element_not_found(selector));
        }
        Ok(elements)
    }

    async fn current_url(&self) -> Option<String> {
        let session = self.session.lock().await;
        session.current.as_ref().map(|page| page.url.clone())
    }

    async fn advance_page(&self, page_number: u32) -> Result<bool, CrawlError> {
        let product_url = {
            let session = self.session.lock().await;
            if session.closed {
                return Err(CrawlError::page_agent("Session is closed"));
            }
            match &session.product_url {
                Some(url) => url.clone(),
                None => return Err(CrawlError::page_agent("No page has been loaded")),
            }
        };

        let target = self
            .site
            .profile()
            .review_page_url(&product_url, page_number);

        match self.fetch(target.as_str()).await {
            Ok(page) => {
                self.session.lock().await.current = Some(page);
                Ok(true)
            }
            Err(e) if matches!(e.kind(), crate::ErrorKind::PageNotFound) => {
                debug!("No review page {} at {}", page_number, target);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn render(&self) -> Result<RenderedPage, CrawlError> {
        let session = self.session.lock().await;
        if session.closed {
            return Err(CrawlError::page_agent("Session is closed"));
        }
        session
            .current
            .clone()
            .ok_or_else(|| CrawlError::page_agent("No page has been loaded"))
    }

    async fn screenshot(&self, label: &str) {
        let Some(page) = self.session.lock().await.current.clone() else {
            debug!("Nothing to capture for '{}'", label);
            return;
        };

        let file_name = format!("{}_{}.html", label, Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.screenshot_dir.join(file_name);

        if let Err(e) = tokio::fs::create_dir_all(&self.screenshot_dir).await {
            warn!(
                "Failed to create capture directory {}: {}",
                self.screenshot_dir.display(),
                e
            );
            return;
        }

        match tokio::fs::write(&path, page.html.as_bytes()).await {
            Ok(()) => debug!("Saved capture: {}", path.display()),
            Err(e) => warn!("Failed to save capture {}: {}", path.display(), e),
        }
    }

    async fn close(&self) -> Result<(), CrawlError> {
        let mut session = self.session.lock().await;
        if !session.closed {
            session.closed = true;
            session.current = None;
            session.product_url = None;
            debug!("Closed {} page agent", self.site);
        }
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use std::fmt;

/// Snapshot of where the crawler was when something went wrong
///
/// Every [`CrawlError`](super::CrawlError) raised by the crawler carries one of these so
/// that log lines and user-facing messages can be traced back to a site, target and page.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlContext {
    /// URL the page agent was on
    pub url: String,

    /// Site identifier (e.g. "coupang")
    pub site_id: String,

    /// Identifier of the crawl target (product id)
    pub target_id: String,

    /// Review page number, when known
    pub page_number: Option<u32>,

    /// Free-form description of the element being handled
    pub element_info: Option<String>,

    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
}

impl CrawlContext {
    /// Creates a context for a site/target pair at the given URL
    pub fn new(
        url: impl Into<String>,
        site_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            site_id: site_id.into(),
            target_id: target_id.into(),
            page_number: None,
            element_info: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    pub fn with_element(mut self, element_info: impl Into<String>) -> Self {
        self.element_info = Some(element_info.into());
        self
    }
}

impl fmt::Display for CrawlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url={}, site={}, target={}",
            self.url, self.site_id, self.target_id
        )?;
        if let Some(page) = self.page_number {
            write!(f, ", page={}", page)?;
        }
        if let Some(element) = &self.element_info {
            write!(f, ", element={}", element)?;
        }
        Ok(())
    }
}

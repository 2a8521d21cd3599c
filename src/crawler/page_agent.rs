use crate::error::CrawlError;
use async_trait::async_trait;
use std::time::Duration;

/// Snapshot of the page currently rendered by a [`PageAgent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Snapshot of one element matched on the current render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Serialized element including its own tag
    pub html: String,

    /// Concatenated, trimmed text content
    pub text: String,
}

/// Controls one rendering session against a remote source
///
/// One agent drives one session and is used sequentially by one orchestrator.
/// Methods take `&self` so that operations can be re-invoked from retry closures;
/// implementations keep their mutable session state behind interior locks.
#[async_trait]
pub trait PageAgent: Send + Sync {
    /// Loads `url` as the current render
    ///
    /// Fails with a navigation, network or timeout error.
    async fn navigate(&self, url: &str) -> Result<(), CrawlError>;

    /// Waits until `selector` matches an element on the current render
    ///
    /// Fails with a timeout or element-not-found error.
    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementSnapshot, CrawlError>;

    /// Waits until `selector` matches and returns every match
    async fn wait_for_elements(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ElementSnapshot>, CrawlError>;

    /// URL of the current render, if anything has been loaded
    async fn current_url(&self) -> Option<String>;

    /// Moves the current render to review page `page_number`
    ///
    /// Returns `Ok(false)` when the source offers no such transition.
    async fn advance_page(&self, page_number: u32) -> Result<bool, CrawlError>;

    /// Snapshot of the current render for extraction
    async fn render(&self) -> Result<RenderedPage, CrawlError>;

    /// Saves a diagnostic capture labelled `label`
    ///
    /// Best-effort: failures are logged by the implementation, never returned.
    async fn screenshot(&self, label: &str);

    /// Ends the session and releases its resources
    async fn close(&self) -> Result<(), CrawlError>;
}

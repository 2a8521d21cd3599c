//! Crawl error taxonomy
//!
//! Every failure the crawler can observe is represented as a [`CrawlError`]: a closed
//! [`ErrorKind`], a human-readable message and an optional [`CrawlContext`]. The
//! [`is_retriable`] function is the single place that decides whether a failure is
//! worth retrying.

mod classify;
mod context;
mod kind;

pub use classify::{is_retriable, Retriability, RetryScope};
pub use context::CrawlContext;
pub use kind::{ErrorFamily, ErrorKind};

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A classified crawl failure
#[derive(Debug, Error)]
#[error("[{}] {kind}: {message}{}", .timestamp.format("%Y-%m-%d %H:%M:%S"), context_suffix(.context))]
pub struct CrawlError {
    kind: ErrorKind,
    message: String,
    context: Option<CrawlContext>,
    timestamp: DateTime<Utc>,
    #[source]
    source: Option<BoxedSource>,
}

fn context_suffix(context: &Option<CrawlContext>) -> String {
    match context {
        Some(ctx) => format!(" ({})", ctx),
        None => String::new(),
    }
}

impl CrawlError {
    /// Creates an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
            timestamp: Utc::now(),
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn http(status_code: u16) -> Self {
        Self::new(
            ErrorKind::Http { status_code },
            format!("HTTP {} error", status_code),
        )
    }

    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        let message = match retry_after {
            Some(wait) => format!("Rate limit exceeded, retry after {}s", wait.as_secs_f64()),
            None => "Rate limit exceeded".to_string(),
        };
        Self::new(ErrorKind::RateLimit { retry_after }, message)
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parsing, message)
    }

    pub fn element_not_found(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        let message = format!("Element not found: {}", selector);
        Self::new(ErrorKind::ElementNotFound { selector }, message)
    }

    pub fn invalid_data(field_name: impl Into<String>, raw_value: Option<String>) -> Self {
        let field_name = field_name.into();
        let message = format!(
            "Invalid data: {} = {}",
            field_name,
            raw_value.as_deref().unwrap_or("<missing>")
        );
        Self::new(
            ErrorKind::InvalidData {
                field_name,
                raw_value,
            },
            message,
        )
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Navigation, message)
    }

    pub fn page_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PageNotFound, message)
    }

    pub fn invalid_page(requested_page: u32, total_pages: u32) -> Self {
        Self::new(
            ErrorKind::InvalidPage {
                requested_page,
                total_pages,
            },
            format!(
                "Invalid page number: {} (total pages: {})",
                requested_page, total_pages
            ),
        )
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    pub fn stale_element(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StaleElement, message)
    }

    pub fn interaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interaction, message)
    }

    pub fn page_agent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PageAgent, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Attaches a context snapshot
    pub fn with_context(mut self, context: CrawlContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches a context only if none is present yet
    pub fn or_context(mut self, context: impl FnOnce() -> CrawlContext) -> Self {
        if self.context.is_none() {
            self.context = Some(context());
        }
        self
    }

    /// Attaches the underlying cause
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&CrawlContext> {
        self.context.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn belongs_to(&self, family: ErrorFamily) -> bool {
        self.kind.belongs_to(family)
    }

    pub fn is_network(&self) -> bool {
        self.kind.is_network()
    }

    pub fn is_parsing(&self) -> bool {
        self.kind.is_parsing()
    }

    pub fn is_navigation(&self) -> bool {
        self.kind.is_navigation()
    }

    pub fn is_resource(&self) -> bool {
        self.kind.is_resource()
    }
}

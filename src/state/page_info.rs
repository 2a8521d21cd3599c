use crate::error::CrawlError;
use crate::{HarvestError, Result};

/// Pagination bounds of one crawl target
///
/// Invariant: `1 <= current_page <= total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    total_pages: u32,

    current_page: u32,

    /// Page cap asked for by the caller, if any
    requested_pages: Option<u32>,
}

impl PageInfo {
    /// Creates pagination bounds positioned on the first page
    ///
    /// # Arguments
    ///
    /// * `total_pages` - Pages the target exposes, at least 1
    /// * `requested_pages` - Optional cap, at least 1 when given
    ///
    /// # Returns
    ///
    /// * `Ok(PageInfo)` - Bounds positioned on page 1
    /// * `Err(HarvestError::InvalidInput)` - If either count is zero
    pub fn new(total_pages: u32, requested_pages: Option<u32>) -> Result<Self> {
        if total_pages < 1 {
            return Err(HarvestError::InvalidInput(format!(
                "total pages must be at least 1, got {}",
                total_pages
            )));
        }

        if requested_pages == Some(0) {
            return Err(HarvestError::InvalidInput(
                "requested pages must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            total_pages,
            current_page: 1,
            requested_pages,
        })
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn requested_pages(&self) -> Option<u32> {
        self.requested_pages
    }

    /// Number of pages this session will visit
    ///
    /// The requested cap when it is within bounds, otherwise every page.
    pub fn pages_to_crawl(&self) -> u32 {
        match self.requested_pages {
            Some(requested) if requested <= self.total_pages => requested,
            _ => self.total_pages,
        }
    }

    /// Returns true once the current page is the last one to visit
    pub fn is_complete(&self) -> bool {
        self.current_page >= self.pages_to_crawl()
    }

    /// Positions on `page`, rejecting anything outside `1..=total_pages`
    pub fn go_to(&mut self, page: u32) -> std::result::Result<(), CrawlError> {
        if page < 1 || page > self.total_pages {
            return Err(CrawlError::invalid_page(page, self.total_pages));
        }
        self.current_page = page;
        Ok(())
    }
}

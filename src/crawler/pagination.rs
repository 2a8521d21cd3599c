//! Pagination discovery and page transitions
//!
//! Total pages come from the site's pagination control when it is present. When it
//! is absent the count is estimated from the displayed record total divided by the
//! site's page capacity, never below one page.

use super::{Extractor, PageAgent, RenderedPage};
use crate::error::CrawlError;
use crate::state::PageInfo;
use crate::{HarvestError, Result};

/// Validates a page count supplied by the user
///
/// # Returns
///
/// * `Ok(u32)` - The count, when it is at least 1
/// * `Err(HarvestError::InvalidInput)` - For zero, negative or oversized values
pub fn validate_requested_pages(requested: i64) -> Result<u32> {
    if requested <= 0 {
        return Err(HarvestError::InvalidInput(format!(
            "requested pages must be at least 1, got {}",
            requested
        )));
    }

    u32::try_from(requested).map_err(|_| {
        HarvestError::InvalidInput(format!("requested pages too large: {}", requested))
    })
}

/// Determines how many pages the target exposes
///
/// # Arguments
///
/// * `extractor` - Site extractor that knows the pagination markup
/// * `page` - The first rendered page of the target
pub fn discover_total_pages<E: Extractor>(extractor: &E, page: &RenderedPage) -> u32 {
    if let Some(total) = extractor.total_pages(page).filter(|total| *total > 0) {
        tracing::debug!("Pagination control reports {} pages", total);
        return total;
    }

    match extractor.displayed_record_count(page) {
        Some(count) => {
            let per_page = u64::from(extractor.records_per_page().max(1));
            let estimate = u32::try_from(count / per_page)
                .unwrap_or(u32::MAX)
                .max(1);
            tracing::info!(
                "No pagination control, estimated {} pages from {} records",
                estimate,
                count
            );
            estimate
        }
        None => {
            tracing::info!("No pagination control or record count, assuming a single page");
            1
        }
    }
}

/// Sets the page range for a session from a discovered total and optional cap
pub fn set_page_range(total_pages: u32, requested_pages: Option<u32>) -> Result<PageInfo> {
    let info = PageInfo::new(total_pages, requested_pages)?;

    if let Some(requested) = requested_pages {
        if requested > total_pages {
            tracing::info!(
                "Requested {} pages but only {} exist, crawling {}",
                requested,
                total_pages,
                info.pages_to_crawl()
            );
        }
    }

    Ok(info)
}

/// Moves the agent to `page` and records the new position
///
/// # Returns
///
/// * `Ok(true)` - The agent moved and `info` now points at `page`
/// * `Ok(false)` - The agent reported no transition, `info` is unchanged
/// * `Err(CrawlError)` - `page` is outside `1..=total_pages`, or the agent failed
pub async fn go_to_page<A: PageAgent + ?Sized>(
    agent: &A,
    info: &mut PageInfo,
    page: u32,
) -> std::result::Result<bool, CrawlError> {
    let mut target = *info;
    target.go_to(page)?;

    if agent.advance_page(page).await? {
        *info = target;
        Ok(true)
    } else {
        Ok(false)
    }
}

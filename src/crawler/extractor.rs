use super::RenderedPage;
use crate::error::CrawlError;
use crate::model::{CrawlRecord, ProductMetadata};
use crate::sites::SiteId;

/// Site-specific extraction of records and metadata from a render
///
/// Extraction is synchronous and works on a [`RenderedPage`] snapshot, so parsed
/// documents never live across an await point.
pub trait Extractor: Send + Sync {
    type Record: CrawlRecord;

    fn site(&self) -> SiteId;

    /// Selector that must be present before records can be extracted
    fn ready_selector(&self) -> Option<&str> {
        None
    }

    /// Records shown on one page of this site
    fn records_per_page(&self) -> u32 {
        self.site().profile().records_per_page
    }

    /// Extracts name, average rating and displayed record count of the target
    fn extract_metadata(&self, page: &RenderedPage) -> Result<ProductMetadata, CrawlError>;

    /// Extracts every record on the current page
    ///
    /// The outer error fails the page as a whole; inner errors belong to single
    /// records and only those records are skipped.
    fn extract_records(
        &self,
        page: &RenderedPage,
        target_id: &str,
    ) -> Result<Vec<Result<Self::Record, CrawlError>>, CrawlError>;

    /// Highest page number offered by the pagination control, if present
    fn total_pages(&self, page: &RenderedPage) -> Option<u32>;

    /// Total record count as displayed on the page, if present
    fn displayed_record_count(&self, page: &RenderedPage) -> Option<u64>;
}

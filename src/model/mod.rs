//! Records produced by a crawl
//!
//! The orchestrator treats records as opaque beyond [`CrawlRecord`]; the concrete
//! [`Review`] type is what the site extractors produce.

mod review;

pub use review::{Review, ReviewRating};

/// A single extracted unit belonging to exactly one crawl target
pub trait CrawlRecord: Send + std::fmt::Debug {
    /// Identity of the record, unique within its target
    fn record_id(&self) -> &str;

    /// Identifier of the target (e.g. product) the record belongs to
    fn target_id(&self) -> &str;
}

/// Summary information about the crawl target itself
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductMetadata {
    pub name: String,

    /// Average rating as displayed by the site, 0.0 when unknown
    pub average_rating: f64,

    /// Total record count as displayed by the site, 0 when unknown
    pub record_count: u64,
}

impl ProductMetadata {
    pub fn new(name: impl Into<String>, average_rating: f64, record_count: u64) -> Self {
        Self {
            name: name.into(),
            average_rating,
            record_count,
        }
    }

    /// Returns true when nothing could be extracted about the target
    pub fn is_unknown(&self) -> bool {
        self.name.is_empty() && self.record_count == 0
    }
}

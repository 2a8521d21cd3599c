//! Supported sites
//!
//! This module provides:
//! - `SiteId`, the closed set of sites the harvester understands
//! - URL normalization, validation and product id extraction
//! - Per-site profiles (page capacity, pagination parameters)
//! - Site-specific record extractors built on `scraper`

mod coupang;
mod html;
mod naver;
mod profile;
mod target;

pub use target::{identify_site, normalize_url, product_url, validate_url, ProductTarget};
pub use coupang::CoupangExtractor;
pub use naver::NaverExtractor;
pub use profile::SiteProfile;

use crate::crawler::{Extractor, RenderedPage};
use crate::error::CrawlError;
use crate::model::{ProductMetadata, Review};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Identifies a supported site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteId {
    Coupang,
    Naver,
}

impl SiteId {
    pub const ALL: [SiteId; 2] = [SiteId::Coupang, SiteId::Naver];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coupang => "coupang",
            Self::Naver => "naver",
        }
    }

    /// Returns the static profile describing this site
    pub fn profile(&self) -> &'static SiteProfile {
        match self {
            Self::Coupang => &profile::COUPANG,
            Self::Naver => &profile::NAVER,
        }
    }

    /// Comma separated list of supported site names
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|site| site.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coupang" => Ok(Self::Coupang),
            "naver" => Ok(Self::Naver),
            other => Err(format!(
                "unknown site '{}', expected one of: {}",
                other,
                Self::supported_list()
            )),
        }
    }
}

/// Extractor selected by [`SiteId`]
#[derive(Debug, Clone)]
pub enum SiteExtractor {
    Coupang(CoupangExtractor),
    Naver(NaverExtractor),
}

impl SiteExtractor {
    pub fn for_site(site: SiteId) -> Self {
        match site {
            SiteId::Coupang => Self::Coupang(CoupangExtractor::new()),
            SiteId::Naver => Self::Naver(NaverExtractor::new()),
        }
    }
}

impl Extractor for SiteExtractor {
    type Record = Review;

    fn site(&self) -> SiteId {
        match self {
            Self::Coupang(inner) => inner.site(),
            Self::Naver(inner) => inner.site(),
        }
    }

    fn ready_selector(&self) -> Option<&str> {
        match self {
            Self::Coupang(inner) => inner.ready_selector(),
            Self::Naver(inner) => inner.ready_selector(),
        }
    }

    fn extract_metadata(&self, page: &RenderedPage) -> Result<ProductMetadata, CrawlError> {
        match self {
            Self::Coupang(inner) => inner.extract_metadata(page),
            Self::Naver(inner) => inner.extract_metadata(page),
        }
    }

    fn extract_records(
        &self,
        page: &RenderedPage,
        target_id: &str,
    ) -> Result<Vec<Result<Review, CrawlError>>, CrawlError> {
        match self {
            Self::Coupang(inner) => inner.extract_records(page, target_id),
            Self::Naver(inner) => inner.extract_records(page, target_id),
        }
    }

    fn total_pages(&self, page: &RenderedPage) -> Option<u32> {
        match self {
            Self::Coupang(inner) => inner.total_pages(page),
            Self::Naver(inner) => inner.total_pages(page),
        }
    }

    fn displayed_record_count(&self, page: &RenderedPage) -> Option<u64> {
        match self {
            Self::Coupang(inner) => inner.displayed_record_count(page),
            Self::Naver(inner) => inner.displayed_record_count(page),
        }
    }
}

//! Exporter capability
//!
//! This module defines the trait interface for persisting a finished crawl.

use crate::model::{ProductMetadata, Review};
use crate::sites::SiteId;
use crate::Result;
use std::path::PathBuf;

/// Persists the records of one crawl session
pub trait Exporter {
    /// Writes `records` together with the product metadata
    ///
    /// # Arguments
    ///
    /// * `records` - Collected records in page order
    /// * `metadata` - Product metadata discovered by the session
    /// * `site` - Site the records came from
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Location of the written export
    /// * `Err(HarvestError)` - Nothing to export or the write failed
    fn export(
        &self,
        records: &[Review],
        metadata: &ProductMetadata,
        site: SiteId,
    ) -> Result<PathBuf>;
}

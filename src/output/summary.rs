//! Session summary
//!
//! Condenses a finished [`CrawlOutcome`] into the numbers shown at the end of a run.

use crate::crawler::CrawlOutcome;
use crate::model::ProductMetadata;
use crate::state::CrawlState;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Headline numbers of one crawl session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub state: CrawlState,
    pub product: ProductMetadata,
    pub records_collected: usize,
    pub pages_visited: u32,
    pub total_pages: Option<u32>,
    pub skipped_records: usize,
    pub elapsed: Duration,
    pub export_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl SessionSummary {
    pub fn from_outcome<R>(outcome: &CrawlOutcome<R>, elapsed: Duration) -> Self {
        Self {
            state: outcome.state,
            product: outcome.metadata.clone(),
            records_collected: outcome.records.len(),
            pages_visited: outcome.pages_visited,
            total_pages: outcome.page_info.map(|info| info.total_pages()),
            skipped_records: outcome.skipped_records,
            elapsed,
            export_path: None,
            error: outcome.error.as_ref().map(|e| e.to_string()),
        }
    }

    pub fn with_export_path(mut self, path: PathBuf) -> Self {
        self.export_path = Some(path);
        self
    }

    /// A session counts as successful when it collected at least one record
    pub fn is_success(&self) -> bool {
        self.records_collected > 0
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Crawl Summary ===")?;
        writeln!(f)?;

        if self.product.is_unknown() {
            writeln!(f, "Product: <metadata unavailable>")?;
        } else {
            writeln!(f, "Product: {}", self.product.name)?;
            writeln!(f, "  Average rating: {:.1}", self.product.average_rating)?;
            writeln!(f, "  Displayed reviews: {}", self.product.record_count)?;
        }
        writeln!(f)?;

        writeln!(f, "End state: {}", self.state)?;
        match self.total_pages {
            Some(total) => writeln!(f, "Pages visited: {} / {}", self.pages_visited, total)?,
            None => writeln!(f, "Pages visited: {}", self.pages_visited)?,
        }
        writeln!(f, "Records collected: {}", self.records_collected)?;
        writeln!(f, "Records skipped: {}", self.skipped_records)?;
        writeln!(f, "Elapsed: {:.1}s", self.elapsed.as_secs_f64())?;

        if let Some(path) = &self.export_path {
            writeln!(f, "Exported to: {}", path.display())?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "Error: {}", error)?;
        }

        Ok(())
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &SessionSummary) {
    println!("{}", summary);
}

//! Output module for persisting and reporting crawl results
//!
//! This module handles:
//! - The `Exporter` capability a finished session is handed to
//! - CSV export of collected reviews
//! - The end-of-run session summary

mod csv_output;
mod summary;
mod traits;

pub use csv_output::{export_file_name, CsvExporter, CSV_FIELDS};
pub use summary::{print_summary, SessionSummary};
pub use traits::Exporter;

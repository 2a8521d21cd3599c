//! CSV export
//!
//! Writes one file per session into the output directory:
//! - The header row
//! - A product-info row carrying the metadata
//! - One row per review, in collection order

use crate::model::{CrawlRecord, ProductMetadata, Review};
use crate::output::Exporter;
use crate::sites::SiteId;
use crate::{HarvestError, Result};
use chrono::Local;
use csv::{Terminator, WriterBuilder};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column order of every exported file
pub const CSV_FIELDS: [&str; 16] = [
    "id",
    "product_id",
    "name",
    "rating",
    "normalized_rating",
    "content",
    "created_at",
    "site",
    "title",
    "author",
    "purchase_date",
    "option_info",
    "likes",
    "image_count",
    "image_urls",
    "review_count",
];

const PRODUCT_ROW_ID: &str = "product_info";
const MAX_NAME_LEN: usize = 50;

/// UTF-8 byte order mark so spreadsheet tools detect the encoding
const BOM: &str = "\u{feff}";

/// [`Exporter`] writing UTF-8 CSV files
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Exporter for CsvExporter {
    fn export(
        &self,
        records: &[Review],
        metadata: &ProductMetadata,
        site: SiteId,
    ) -> Result<PathBuf> {
        if records.is_empty() {
            return Err(HarvestError::Export("no records to export".to_string()));
        }

        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(export_file_name(
            site,
            &metadata.name,
            &Local::now().format("%Y%m%d_%H%M%S").to_string(),
        ));

        let mut file = File::create(&path)?;
        file.write_all(BOM.as_bytes())?;

        let mut writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(file);
        writer.write_record(CSV_FIELDS)?;

        let product_id = records
            .first()
            .map(|r| r.target_id().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        writer.write_record(product_row(&product_id, metadata, site))?;

        for review in records {
            writer.write_record(review_row(review))?;
        }
        writer.flush()?;

        info!("Exported {} records to {}", records.len(), path.display());
        Ok(path)
    }
}

/// Builds `<site>_<safe name>_<timestamp>.csv`
///
/// Every non-alphanumeric character of the product name becomes `_` and the name is
/// cut to 50 characters.
pub fn export_file_name(site: SiteId, product_name: &str, timestamp: &str) -> String {
    let name = if product_name.trim().is_empty() {
        "unknown_product"
    } else {
        product_name
    };

    let safe: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(MAX_NAME_LEN)
        .collect();

    format!("{}_{}_{}.csv", site, safe, timestamp)
}

fn product_row(product_id: &str, metadata: &ProductMetadata, site: SiteId) -> Vec<String> {
    let mut row = vec![String::new(); CSV_FIELDS.len()];
    row[0] = PRODUCT_ROW_ID.to_string();
    row[1] = product_id.to_string();
    row[2] = metadata.name.clone();
    row[3] = metadata.average_rating.to_string();
    row[5] = format!("상품명: {}", metadata.name);
    row[7] = site.to_string();
    row[15] = metadata.record_count.to_string();
    row
}

fn review_row(review: &Review) -> Vec<String> {
    vec![
        review.id.clone(),
        review.product_id.clone(),
        String::new(),
        review.rating.score.to_string(),
        review.rating.normalized_score().to_string(),
        review.content.clone(),
        review.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        review.site.to_string(),
        review.title.clone().unwrap_or_default(),
        review.author.clone().unwrap_or_default(),
        review
            .purchase_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        review.option_info.clone().unwrap_or_default(),
        review.likes.map(|l| l.to_string()).unwrap_or_default(),
        review.image_count().to_string(),
        review.image_urls.join(";"),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReviewRating;

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(SiteId::Coupang, "Wireless Mouse (Black)", "20240101_120000"),
            "coupang_Wireless_Mouse__Black__20240101_120000.csv"
        );
        assert_eq!(
            export_file_name(SiteId::Naver, "", "20240101_120000"),
            "naver_unknown_product_20240101_120000.csv"
        );

        let long = "x".repeat(80);
        let name = export_file_name(SiteId::Naver, &long, "t");
        assert_eq!(name, format!("naver_{}_t.csv", "x".repeat(50)));
    }

    #[test]
    fn test_korean_names_are_kept() {
        assert_eq!(
            export_file_name(SiteId::Naver, "머그 컵", "t"),
            "naver_머그_컵_t.csv"
        );
    }

    #[test]
    fn test_export_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());
        let result = exporter.export(&[], &ProductMetadata::default(), SiteId::Coupang);
        assert!(matches!(result, Err(HarvestError::Export(_))));
    }

    #[test]
    fn test_export_quotes_multiline_content() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());
        let review = Review {
            id: "rv-9".to_string(),
            product_id: "42".to_string(),
            site: SiteId::Coupang,
            rating: ReviewRating::out_of_five(5.0),
            content: "first line\nsecond, \"quoted\" line".to_string(),
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            title: None,
            author: None,
            purchase_date: None,
            option_info: Some("Color: Red".to_string()),
            likes: None,
            image_urls: Vec::new(),
        };
        let metadata = ProductMetadata::new("Mug", 4.5, 10);

        let path = exporter.export(&[review], &metadata, SiteId::Coupang).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let content = content.strip_prefix(BOM).unwrap();

        let mut reader = csv::ReaderBuilder::new().from_reader(content.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), CSV_FIELDS.len());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "product_info");
        assert_eq!(&rows[0][5], "상품명: Mug");
        assert_eq!(&rows[1][0], "rv-9");
        assert_eq!(&rows[1][5], "first line\nsecond, \"quoted\" line");
        assert_eq!(&rows[1][11], "Color: Red");
        assert!(content.contains("\"first line\nsecond, \"\"quoted\"\" line\""));
    }
}

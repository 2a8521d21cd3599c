//! CSV export and configuration files on disk

use chrono::NaiveDate;
use review_harvester::config::load_config;
use review_harvester::model::{ProductMetadata, Review, ReviewRating};
use review_harvester::output::{CsvExporter, Exporter, CSV_FIELDS};
use review_harvester::rate_limit::{RateLimiter, RequestClass};
use review_harvester::sites::SiteId;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn create_test_review(id: &str, content: &str) -> Review {
    Review {
        id: id.to_string(),
        product_id: "987".to_string(),
        site: SiteId::Naver,
        rating: ReviewRating::out_of_five(4.0),
        content: content.to_string(),
        created_at: NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        title: Some("Nice".to_string()),
        author: Some("park****".to_string()),
        purchase_date: NaiveDate::from_ymd_opt(2024, 2, 20),
        option_info: None,
        likes: Some(3),
        image_urls: vec![
            "https://img.example/a.png".to_string(),
            "https://img.example/b.png".to_string(),
        ],
    }
}

#[test]
fn test_csv_export_layout() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = CsvExporter::new(dir.path().join("nested/out"));
    let records = vec![
        create_test_review("rv-1", "Keeps coffee warm"),
        create_test_review("rv-2", "Big, \"sturdy\" mug"),
    ];
    let metadata = ProductMetadata::new("Ceramic Mug 350ml", 4.8, 2345);

    let path = exporter.export(&records, &metadata, SiteId::Naver).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("naver_Ceramic_Mug_350ml_"));
    assert!(name.ends_with(".csv"));

    let content = std::fs::read_to_string(&path).unwrap();
    let content = content.strip_prefix('\u{feff}').unwrap();
    let lines: Vec<&str> = content.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 4);

    assert_eq!(lines[0], CSV_FIELDS.join(","));
    assert!(lines[1].starts_with("product_info,987,Ceramic Mug 350ml,4.8,"));
    assert!(lines[1].ends_with(",2345"));
    assert_eq!(
        lines[2],
        "rv-1,987,,4,4,Keeps coffee warm,2024-03-02 00:00:00,naver,Nice,park****,\
         2024-02-20,,3,2,https://img.example/a.png;https://img.example/b.png,"
    );
    assert!(lines[3].contains(",\"Big, \"\"sturdy\"\" mug\","));
}

#[tokio::test(start_paused = true)]
async fn test_config_file_drives_rate_limiter() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[crawler]
output-dir = "exports"

[[site]]
site = "coupang"
requests-per-second = 2.0
burst-size = 4
backoff-factor = 2.0
min-delay = 0.25
max-delay = 8.0
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.crawler.output_dir, "exports");

    let limits = config
        .site_limits()
        .unwrap()
        .into_iter()
        .map(|(site, limit)| (site.as_str(), limit));
    let limiter = RateLimiter::with_sites(config.class_multipliers, limits)
        .await
        .unwrap();

    assert!(limiter.is_configured("coupang").await);
    assert!(limiter.is_configured("naver").await);

    // element queries run at 1.5x the base rate, burst unchanged
    let query = limiter
        .snapshot("coupang", RequestClass::ElementQuery)
        .await
        .unwrap();
    assert_eq!(query.config.requests_per_second, 3.0);
    assert_eq!(query.config.burst_size, 4);

    let navigation = limiter
        .snapshot("coupang", RequestClass::Navigation)
        .await
        .unwrap();
    assert_eq!(navigation.config.burst_size, 2);
    assert_eq!(navigation.config.min_delay, Duration::from_millis(500));
    assert_eq!(navigation.config.max_delay, Duration::from_secs(8));

    let naver = limiter
        .snapshot("naver", RequestClass::ElementQuery)
        .await
        .unwrap();
    assert_eq!(naver.config.burst_size, 5);
}

//! Review Harvester main entry point
//!
//! This is the command-line interface for crawling the reviews of one product.

use anyhow::Context;
use clap::Parser;
use review_harvester::config::{load_or_default, Config};
use review_harvester::crawler::{crawl, pagination, ShutdownHandle};
use review_harvester::output::{print_summary, CsvExporter, Exporter, SessionSummary};
use review_harvester::rate_limit::RateLimiter;
use review_harvester::sites::validate_url;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Review Harvester: crawls product reviews into CSV files
///
/// Supported sites are Coupang and Naver Shopping. Requests are paced per site,
/// transient failures are retried, and Ctrl-C stops the crawl after the current page.
#[derive(Parser, Debug)]
#[command(name = "review-harvester")]
#[command(version)]
#[command(about = "Crawls product reviews into CSV files", long_about = None)]
struct Cli {
    /// Product page URL
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum number of review pages to crawl (default: all)
    #[arg(value_name = "PAGES", allow_hyphen_values = true)]
    pages: Option<i64>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the URL, print the site and product id, and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("review_harvester=info,warn"),
            1 => EnvFilter::new("review_harvester=debug,info"),
            2 => EnvFilter::new("review_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let target = match validate_url(&cli.url) {
        Ok(target) => target,
        Err(e) => {
            tracing::error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.check {
        println!("Site: {}", target.site);
        println!("Product ID: {}", target.product_id);
        println!("URL: {}", target.url);
        return Ok(ExitCode::SUCCESS);
    }

    let requested_pages = match cli.pages.map(pagination::validate_requested_pages) {
        None => None,
        Some(Ok(pages)) => Some(pages),
        Some(Err(e)) => {
            tracing::error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let config = load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = &cli.config {
        tracing::info!("Configuration loaded from: {}", path.display());
    }

    handle_crawl(&config, target, requested_pages).await
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    target: review_harvester::ProductTarget,
    requested_pages: Option<u32>,
) -> anyhow::Result<ExitCode> {
    tracing::info!("Starting crawl of {} product {}", target.site, target.product_id);
    match requested_pages {
        Some(pages) => tracing::info!("Page limit: {}", pages),
        None => tracing::info!("Page limit: all"),
    }

    let limits = config
        .site_limits()?
        .into_iter()
        .map(|(site, limit)| (site.as_str(), limit));
    let limiter = Arc::new(
        RateLimiter::with_sites(config.class_multipliers, limits)
            .await
            .context("Invalid rate limit configuration")?,
    );

    let shutdown = ShutdownHandle::new();
    let listener = shutdown.listen_for_ctrl_c();

    let started = Instant::now();
    let result = crawl(
        config,
        limiter,
        shutdown.clone(),
        &target,
        requested_pages,
    )
    .await;

    let cleaned = shutdown.cleanup().await;
    listener.abort();
    if cleaned {
        tracing::debug!("Cleanup actions completed");
    }

    let outcome = result.context("Crawl failed")?;
    let mut summary = SessionSummary::from_outcome(&outcome, started.elapsed());

    if outcome.records.is_empty() {
        print_summary(&summary);
        tracing::error!("No reviews were collected");
        return Ok(ExitCode::FAILURE);
    }

    let exporter = CsvExporter::new(&config.crawler.output_dir);
    let path = exporter
        .export(&outcome.records, &outcome.metadata, target.site)
        .context("Failed to export reviews")?;
    summary = summary.with_export_path(path);

    print_summary(&summary);
    Ok(ExitCode::SUCCESS)
}

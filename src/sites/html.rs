//! Small scraper helpers shared by the site extractors

use crate::error::CrawlError;
use chrono::{NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Selector};

/// Parses a CSS selector, reporting failures as parsing errors
pub(crate) fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::parsing(format!("Invalid selector '{}': {}", css, e)))
}

/// Text content of an element with fragments trimmed and joined by spaces
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First descendant of `scope` matching `css`
pub(crate) fn select_first<'a>(
    scope: ElementRef<'a>,
    css: &str,
) -> Result<Option<ElementRef<'a>>, CrawlError> {
    Ok(scope.select(&selector(css)?).next())
}

/// Every descendant of `scope` matching `css`
pub(crate) fn select_all<'a>(
    scope: ElementRef<'a>,
    css: &str,
) -> Result<Vec<ElementRef<'a>>, CrawlError> {
    Ok(scope.select(&selector(css)?).collect())
}

/// First match of the first candidate selector that matches anything
pub(crate) fn first_of<'a>(
    scope: ElementRef<'a>,
    candidates: &[&str],
) -> Result<Option<ElementRef<'a>>, CrawlError> {
    for css in candidates {
        if let Some(found) = select_first(scope, css)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Text of the first match, `None` when missing or blank
pub(crate) fn optional_text(scope: ElementRef<'_>, css: &str) -> Result<Option<String>, CrawlError> {
    Ok(select_first(scope, css)?
        .map(element_text)
        .filter(|t| !t.is_empty()))
}

/// Text of the first match, element-not-found when missing
pub(crate) fn required_text(scope: ElementRef<'_>, css: &str) -> Result<String, CrawlError> {
    select_first(scope, css)?
        .map(element_text)
        .ok_or_else(|| CrawlError::element_not_found(css))
}

/// First run of digits in `text`, ignoring thousands separators
pub(crate) fn parse_count(text: &str) -> Option<u64> {
    let cleaned = text.replace(',', "");
    let digits: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parses a score after removing the given labels
pub(crate) fn parse_score(text: &str, labels: &[&str]) -> Option<f64> {
    let mut cleaned = text.to_string();
    for label in labels {
        cleaned = cleaned.replace(label, "");
    }
    cleaned.trim().parse::<f64>().ok().filter(|s| s.is_finite())
}

/// Parses a date at midnight
pub(crate) fn parse_date(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(text.trim(), format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Highest page number among the pagination buttons matched by `css`
pub(crate) fn max_page_number(scope: ElementRef<'_>, css: &str) -> Option<u32> {
    let buttons = select_all(scope, css).ok()?;
    buttons
        .into_iter()
        .filter_map(|button| {
            button
                .value()
                .attr("data-page")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .or_else(|| element_text(button).parse::<u32>().ok())
        })
        .max()
        .filter(|page| *page > 0)
}

/// `src` attributes of every image matched by `css`
pub(crate) fn image_urls(scope: ElementRef<'_>, css: &str) -> Result<Vec<String>, CrawlError> {
    Ok(select_all(scope, css)?
        .into_iter()
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect())
}

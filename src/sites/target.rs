use super::SiteId;
use crate::{UrlError, UrlResult};
use url::Url;

/// A validated crawl target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTarget {
    pub site: SiteId,
    pub product_id: String,
    pub url: Url,
}

impl ProductTarget {
    pub fn new(site: SiteId, product_id: impl Into<String>, url: Url) -> Self {
        Self {
            site,
            product_id: product_id.into(),
            url,
        }
    }
}

/// Normalizes user input into an absolute URL string
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Prepend `https://` when no HTTP(S) scheme is present
///
/// # Examples
///
/// ```
/// use review_harvester::sites::normalize_url;
///
/// assert_eq!(
///     normalize_url("  www.coupang.com/vp/products/1 "),
///     "https://www.coupang.com/vp/products/1"
/// );
/// assert_eq!(normalize_url("http://a.com"), "http://a.com");
/// ```
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn bare_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Identifies the site and product id of a product page URL
///
/// # Recognized Patterns
///
/// - `coupang.com/vp/products/<digits>`
/// - `shopping.naver.com/product/<digits>` and `shopping.naver.com/catalog/<digits>`
///
/// # Returns
///
/// * `Some((site, product_id))` - The URL is a product page of a supported site
/// * `None` - Anything else
pub fn identify_site(url: &Url) -> Option<(SiteId, String)> {
    let host = bare_host(url)?;
    let segments: Vec<&str> = url.path_segments()?.collect();

    match (host.as_str(), segments.as_slice()) {
        ("coupang.com", ["vp", "products", id, ..]) if is_numeric(id) => {
            Some((SiteId::Coupang, id.to_string()))
        }
        ("shopping.naver.com", ["product" | "catalog", id, ..]) if is_numeric(id) => {
            Some((SiteId::Naver, id.to_string()))
        }
        _ => None,
    }
}

fn is_supported_host(host: &str) -> bool {
    host == "coupang.com"
        || host.ends_with(".coupang.com")
        || host == "naver.com"
        || host.ends_with(".naver.com")
}

/// Validates user input as a product page of a supported site
///
/// # Arguments
///
/// * `input` - The raw URL as typed by the user
///
/// # Returns
///
/// * `Ok(ProductTarget)` - Site, product id and normalized URL
/// * `Err(UrlError)` - Empty, malformed, unsupported site or not a product page
///
/// # Examples
///
/// ```
/// use review_harvester::sites::{validate_url, SiteId};
///
/// let target = validate_url("www.coupang.com/vp/products/123456").unwrap();
/// assert_eq!(target.site, SiteId::Coupang);
/// assert_eq!(target.product_id, "123456");
/// ```
pub fn validate_url(input: &str) -> UrlResult<ProductTarget> {
    if input.trim().is_empty() {
        return Err(UrlError::Empty);
    }

    let normalized = normalize_url(input);
    let url = Url::parse(&normalized).map_err(|e| UrlError::Malformed(e.to_string()))?;

    let host = bare_host(&url).ok_or_else(|| UrlError::Malformed(normalized.clone()))?;
    if !host.contains('.') {
        return Err(UrlError::Malformed(normalized));
    }

    if !is_supported_host(&host) {
        return Err(UrlError::UnsupportedSite {
            host,
            supported: SiteId::supported_list(),
        });
    }

    let (site, product_id) =
        identify_site(&url).ok_or_else(|| UrlError::NotProductPage(normalized.clone()))?;

    Ok(ProductTarget {
        site,
        product_id,
        url,
    })
}

/// Canonical product page URL for a site
pub fn product_url(site: SiteId, product_id: &str) -> String {
    match site {
        SiteId::Coupang => format!("https://www.coupang.com/vp/products/{}", product_id),
        SiteId::Naver => format!("https://shopping.naver.com/product/{}", product_id),
    }
}

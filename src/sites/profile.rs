use super::SiteId;
use url::Url;

/// Static per-site crawl parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub site: SiteId,

    /// Records shown on one review page, used to estimate page counts
    pub records_per_page: u32,

    /// Query parameter selecting the review page
    pub page_param: &'static str,
}

pub(super) static COUPANG: SiteProfile = SiteProfile {
    site: SiteId::Coupang,
    records_per_page: 10,
    page_param: "reviewPage",
};

pub(super) static NAVER: SiteProfile = SiteProfile {
    site: SiteId::Naver,
    records_per_page: 20,
    page_param: "page",
};

impl SiteProfile {
    /// Builds the URL of review page `page` from the product URL
    ///
    /// Any existing value of the page parameter is replaced; other query
    /// parameters and the path are preserved.
    pub fn review_page_url(&self, product_url: &Url, page: u32) -> Url {
        let mut url = product_url.clone();
        let kept: Vec<(String, String)> = product_url
            .query_pairs()
            .filter(|(key, _)| key != self.page_param)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (key, value) in &kept {
                query.append_pair(key, value);
            }
            query.append_pair(self.page_param, &page.to_string());
        }

        url
    }

    /// Estimates total pages from a displayed record count, never below 1
    pub fn estimate_pages(&self, record_count: u64) -> u32 {
        let pages = record_count / u64::from(self.records_per_page.max(1));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }
}

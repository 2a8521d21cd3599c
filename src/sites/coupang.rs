use super::html::{
    element_text, first_of, image_urls, max_page_number, optional_text, parse_count,
    parse_date, parse_score, required_text, select_all, select_first,
};
use super::SiteId;
use crate::crawler::{Extractor, RenderedPage};
use crate::error::CrawlError;
use crate::model::{ProductMetadata, Review, ReviewRating};
use scraper::{ElementRef, Html};

const REVIEW_ARTICLE: &str = ".js_reviewArticleContainer";
const DATE_FORMAT: &str = "%Y.%m.%d";

const TITLE_CANDIDATES: &[&str] = &[
    ".product-title",
    ".prod-buy-header__title",
    ".prod-buy-header h2",
    "[class*='prod-buy-header'] h2",
];

const RATING_CANDIDATES: &[&str] = &[
    ".prod-buy-header__rating",
    "[class*='rating']",
    "[class*='star-rating']",
];

const COUNT_CANDIDATES: &[&str] = &[
    ".prod-buy-header__review-count",
    "[class*='review-count']",
    "a[href*='productReview']",
];

/// Extracts reviews from Coupang product pages
#[derive(Debug, Clone, Default)]
pub struct CoupangExtractor;

impl CoupangExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_review(&self, article: ElementRef<'_>, product_id: &str) -> Result<Review, CrawlError> {
        let id = article
            .value()
            .attr("data-review-id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CrawlError::invalid_data("review_id", None))?
            .to_string();

        let rating_element = select_first(article, "[data-rating]")?;
        let score = rating_element
            .and_then(|el| el.value().attr("data-rating"))
            .and_then(|raw| parse_score(raw, &[]))
            .ok_or_else(|| {
                CrawlError::invalid_data("rating", rating_element.map(element_text))
            })?;

        let date_text = optional_text(article, ".js_reviewArticleCreateDate")?;
        let created_at = date_text
            .as_deref()
            .and_then(|text| parse_date(text, DATE_FORMAT))
            .ok_or_else(|| CrawlError::invalid_data("created_at", date_text.clone()))?;

        let author = required_text(article, ".js_reviewUserProfileImage")?;
        let content = required_text(article, ".js_reviewArticleContent")?;
        let option_info = optional_text(article, ".js_reviewArticleOptionName")?;

        let likes = optional_text(article, ".js_reviewArticleHelpfulCount")?
            .and_then(|text| parse_count(&text))
            .and_then(|count| u32::try_from(count).ok())
            .unwrap_or(0);

        Ok(Review {
            id,
            product_id: product_id.to_string(),
            site: SiteId::Coupang,
            rating: ReviewRating::out_of_five(score),
            content,
            created_at,
            title: None,
            author: Some(author),
            purchase_date: None,
            option_info,
            likes: Some(likes),
            image_urls: image_urls(article, ".js_reviewArticleImageContainer img")?,
        })
    }
}

impl Extractor for CoupangExtractor {
    type Record = Review;

    fn site(&self) -> SiteId {
        SiteId::Coupang
    }

    fn ready_selector(&self) -> Option<&str> {
        Some(REVIEW_ARTICLE)
    }

    fn extract_metadata(&self, page: &RenderedPage) -> Result<ProductMetadata, CrawlError> {
        let document = Html::parse_document(&page.html);
        let root = document.root_element();

        let title = first_of(root, TITLE_CANDIDATES)?
            .ok_or_else(|| CrawlError::element_not_found(TITLE_CANDIDATES.join(", ")))?;
        let name = element_text(title);
        if name.is_empty() {
            return Err(CrawlError::invalid_data("product_name", Some(String::new())));
        }

        let rating = first_of(root, RATING_CANDIDATES)?
            .ok_or_else(|| CrawlError::element_not_found(RATING_CANDIDATES.join(", ")))?;
        let rating_text = match select_first(rating, "span")? {
            Some(span) => element_text(span),
            None => element_text(rating),
        };
        let average_rating = parse_score(&rating_text, &[])
            .ok_or_else(|| CrawlError::invalid_data("average_rating", Some(rating_text.clone())))?;

        let count = first_of(root, COUNT_CANDIDATES)?
            .ok_or_else(|| CrawlError::element_not_found(COUNT_CANDIDATES.join(", ")))?;
        let count_text = element_text(count);
        let record_count = parse_count(&count_text)
            .ok_or_else(|| CrawlError::invalid_data("review_count", Some(count_text.clone())))?;

        Ok(ProductMetadata::new(name, average_rating, record_count))
    }

    fn extract_records(
        &self,
        page: &RenderedPage,
        target_id: &str,
    ) -> Result<Vec<Result<Review, CrawlError>>, CrawlError> {
        let document = Html::parse_document(&page.html);
        let articles = select_all(document.root_element(), REVIEW_ARTICLE)?;

        Ok(articles
            .into_iter()
            .map(|article| self.parse_review(article, target_id))
            .collect())
    }

    fn total_pages(&self, page: &RenderedPage) -> Option<u32> {
        let document = Html::parse_document(&page.html);
        max_page_number(
            document.root_element(),
            ".js_reviewArticlePageNavigationContainer button.js_reviewArticlePageNavigationButton",
        )
    }

    fn displayed_record_count(&self, page: &RenderedPage) -> Option<u64> {
        let document = Html::parse_document(&page.html);
        select_first(document.root_element(), ".js_reviewArticleCount")
            .ok()
            .flatten()
            .and_then(|el| parse_count(&element_text(el)))
    }
}

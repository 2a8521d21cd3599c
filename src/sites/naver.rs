use super::html::{
    element_text, image_urls, max_page_number, optional_text, parse_count, parse_date,
    parse_score, required_text, select_all, select_first,
};
use super::SiteId;
use crate::crawler::{Extractor, RenderedPage};
use crate::error::CrawlError;
use crate::model::{ProductMetadata, Review, ReviewRating};
use chrono::Utc;
use scraper::{ElementRef, Html};

const REVIEW_ITEM: &str = ".reviewItem_review_item__2aYAB";
const DATE_FORMAT: &str = "%Y.%m.%d.";
const SCORE_LABEL: &str = "평점";
const PURCHASE_LABEL: &str = "구매";

/// Extracts reviews from Naver Shopping product pages
#[derive(Debug, Clone, Default)]
pub struct NaverExtractor;

impl NaverExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_review(
        &self,
        item: ElementRef<'_>,
        product_id: &str,
        position: usize,
    ) -> Result<Review, CrawlError> {
        // Items without an id get a synthetic one
        let id = item
            .value()
            .attr("id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "naver_{}_{}_{}",
                    product_id,
                    Utc::now().format("%Y%m%d%H%M%S%f"),
                    position
                )
            });

        let rating_text = optional_text(item, ".reviewItem_info_grade__1s0Kh")?;
        let score = rating_text
            .as_deref()
            .and_then(|text| parse_score(text, &[SCORE_LABEL]))
            .ok_or_else(|| CrawlError::invalid_data("rating", rating_text.clone()))?;

        let date_text = optional_text(item, ".reviewItem_info_date__1DvUK")?;
        let created_at = date_text
            .as_deref()
            .and_then(|text| parse_date(text, DATE_FORMAT))
            .ok_or_else(|| CrawlError::invalid_data("created_at", date_text.clone()))?;

        let author = required_text(item, ".reviewItem_info_user__1WUwj")?;
        let content = required_text(item, ".reviewItem_text__2MeUk")?;

        let likes = optional_text(item, ".reviewItem_help_count__3Ml7n")?
            .and_then(|text| parse_count(&text))
            .and_then(|count| u32::try_from(count).ok())
            .unwrap_or(0);

        let purchase_date = optional_text(item, ".reviewItem_info_purchase_date__4XTRF")?
            .and_then(|text| parse_date(&text.replace(PURCHASE_LABEL, ""), DATE_FORMAT))
            .map(|at| at.date());

        Ok(Review {
            id,
            product_id: product_id.to_string(),
            site: SiteId::Naver,
            rating: ReviewRating::out_of_five(score),
            content,
            created_at,
            title: optional_text(item, ".reviewItem_title__3jUBx")?,
            author: Some(author),
            purchase_date,
            option_info: optional_text(item, ".reviewItem_option__3xQGy")?,
            likes: Some(likes),
            image_urls: image_urls(item, ".reviewItem_thumb_container__1iKDx img")?,
        })
    }
}

impl Extractor for NaverExtractor {
    type Record = Review;

    fn site(&self) -> SiteId {
        SiteId::Naver
    }

    fn ready_selector(&self) -> Option<&str> {
        Some(REVIEW_ITEM)
    }

    fn extract_metadata(&self, page: &RenderedPage) -> Result<ProductMetadata, CrawlError> {
        let document = Html::parse_document(&page.html);
        let root = document.root_element();

        let name = required_text(root, ".product_title_text__wWwGj")?;
        if name.is_empty() {
            return Err(CrawlError::invalid_data("product_name", Some(name)));
        }

        let rating_text = optional_text(root, ".product_review_score__yGkGb")?;
        let average_rating = rating_text
            .as_deref()
            .and_then(|text| parse_score(text, &[SCORE_LABEL]))
            .ok_or_else(|| CrawlError::invalid_data("average_rating", rating_text.clone()))?;

        let count_text = optional_text(root, ".product_review_count__mRWxH")?;
        let record_count = count_text
            .as_deref()
            .and_then(parse_count)
            .ok_or_else(|| CrawlError::invalid_data("review_count", count_text.clone()))?;

        Ok(ProductMetadata::new(name, average_rating, record_count))
    }

    fn extract_records(
        &self,
        page: &RenderedPage,
        target_id: &str,
    ) -> Result<Vec<Result<Review, CrawlError>>, CrawlError> {
        let document = Html::parse_document(&page.html);
        let items = select_all(document.root_element(), REVIEW_ITEM)?;

        Ok(items
            .into_iter()
            .enumerate()
            .map(|(position, item)| self.parse_review(item, target_id, position))
            .collect())
    }

    fn total_pages(&self, page: &RenderedPage) -> Option<u32> {
        let document = Html::parse_document(&page.html);
        max_page_number(
            document.root_element(),
            ".pagination_pagination__JW7zT a.pagination_btn__mEwdB",
        )
    }

    fn displayed_record_count(&self, page: &RenderedPage) -> Option<u64> {
        let document = Html::parse_document(&page.html);
        select_first(document.root_element(), ".review_total_count__PjXXP")
            .ok()
            .flatten()
            .and_then(|el| parse_count(&element_text(el)))
    }
}

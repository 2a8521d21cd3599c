use super::CrawlRecord;
use crate::sites::SiteId;
use chrono::{NaiveDate, NaiveDateTime};

/// Rating given by a reviewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewRating {
    pub score: f64,
    pub max_score: f64,
}

impl ReviewRating {
    /// Rating on the usual five-point scale
    pub fn out_of_five(score: f64) -> Self {
        Self {
            score,
            max_score: 5.0,
        }
    }

    /// Rating rescaled to a five-point scale
    pub fn normalized_score(&self) -> f64 {
        if self.max_score <= 0.0 {
            return 0.0;
        }
        self.score / self.max_score * 5.0
    }
}

/// One product review
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub site: SiteId,
    pub rating: ReviewRating,
    pub content: String,
    pub created_at: NaiveDateTime,

    pub title: Option<String>,
    pub author: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub option_info: Option<String>,
    pub likes: Option<u32>,
    pub image_urls: Vec<String>,
}

impl Review {
    pub fn image_count(&self) -> usize {
        self.image_urls.len()
    }
}

impl CrawlRecord for Review {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn target_id(&self) -> &str {
        &self.product_id
    }
}

//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: The state machine a crawl session moves through
//! - `PageInfo`: Pagination bounds and the current position within them

mod crawl_state;
mod page_info;

pub use crawl_state::CrawlState;
pub use page_info::PageInfo;

//! Page agent implementations
//!
//! This module provides the concrete [`PageAgent`](crate::crawler::PageAgent)
//! used by the binary:
//! - [`HttpPageAgent`] fetches server-rendered pages with reqwest and answers
//!   element queries against the fetched document with scraper

mod http;

pub use http::{classify_request_error, select_elements, HttpPageAgent};

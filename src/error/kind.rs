use std::fmt;
use std::time::Duration;

/// The closed set of failure kinds the crawler can produce
///
/// Kinds form a shallow hierarchy (see [`ErrorKind::lineage`]): for example a
/// `RateLimit` is also an `Http` error, which is also a `Network` error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // ===== Network family =====
    /// Connection or DNS failure
    Network,

    /// A wait-for-condition exceeded its deadline
    Timeout,

    /// Non-success HTTP response
    Http { status_code: u16 },

    /// HTTP 429, optionally with the server-provided wait
    RateLimit { retry_after: Option<Duration> },

    // ===== Parsing family =====
    /// Extraction failed on malformed data
    Parsing,

    /// A required element was missing from the render
    ElementNotFound { selector: String },

    /// A field could not be converted
    InvalidData {
        field_name: String,
        raw_value: Option<String>,
    },

    // ===== Navigation family =====
    /// Page transition failed
    Navigation,

    /// Target page does not exist
    PageNotFound,

    /// Requested page is outside the discovered range
    InvalidPage { requested_page: u32, total_pages: u32 },

    // ===== Resource family =====
    /// Agent/session-level failure
    Resource,

    /// An element handle went stale between lookup and use
    StaleElement,

    /// An element could not be interacted with
    Interaction,

    /// The page agent itself failed
    PageAgent,

    /// Persisting results failed
    Storage,
}

/// Names a node in the error hierarchy
///
/// Retry policies use families to describe which errors are eligible for retry
/// consideration. A family matches its own kind and every kind below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    /// Matches every kind
    Any,
    Network,
    Timeout,
    Http,
    RateLimit,
    Parsing,
    ElementNotFound,
    InvalidData,
    Navigation,
    PageNotFound,
    InvalidPage,
    Resource,
    StaleElement,
    Interaction,
    PageAgent,
    Storage,
}

impl ErrorKind {
    /// Returns this kind's family followed by all of its ancestors
    pub fn lineage(&self) -> &'static [ErrorFamily] {
        use ErrorFamily as F;
        match self {
            Self::Network => &[F::Network],
            Self::Timeout => &[F::Timeout, F::Network],
            Self::Http { .. } => &[F::Http, F::Network],
            Self::RateLimit { .. } => &[F::RateLimit, F::Http, F::Network],
            Self::Parsing => &[F::Parsing],
            Self::ElementNotFound { .. } => &[F::ElementNotFound, F::Parsing],
            Self::InvalidData { .. } => &[F::InvalidData, F::Parsing],
            Self::Navigation => &[F::Navigation],
            Self::PageNotFound => &[F::PageNotFound, F::Navigation],
            Self::InvalidPage { .. } => &[F::InvalidPage, F::Navigation],
            Self::Resource => &[F::Resource],
            Self::StaleElement => &[F::StaleElement, F::PageAgent, F::Resource],
            Self::Interaction => &[F::Interaction, F::PageAgent, F::Resource],
            Self::PageAgent => &[F::PageAgent, F::Resource],
            Self::Storage => &[F::Storage, F::Resource],
        }
    }

    /// Returns true if this kind is `family` or one of its descendants
    pub fn belongs_to(&self, family: ErrorFamily) -> bool {
        family == ErrorFamily::Any || self.lineage().contains(&family)
    }

    pub fn is_network(&self) -> bool {
        self.belongs_to(ErrorFamily::Network)
    }

    pub fn is_parsing(&self) -> bool {
        self.belongs_to(ErrorFamily::Parsing)
    }

    pub fn is_navigation(&self) -> bool {
        self.belongs_to(ErrorFamily::Navigation)
    }

    pub fn is_resource(&self) -> bool {
        self.belongs_to(ErrorFamily::Resource)
    }

    /// HTTP status associated with this kind, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status_code } => Some(*status_code),
            Self::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::Network => "NetworkError",
            Self::Timeout => "TimeoutError",
            Self::Http { .. } => "HttpError",
            Self::RateLimit { .. } => "RateLimitError",
            Self::Parsing => "ParsingError",
            Self::ElementNotFound { .. } => "ElementNotFoundError",
            Self::InvalidData { .. } => "InvalidDataError",
            Self::Navigation => "NavigationError",
            Self::PageNotFound => "PageNotFoundError",
            Self::InvalidPage { .. } => "InvalidPageError",
            Self::Resource => "ResourceError",
            Self::StaleElement => "StaleElementError",
            Self::Interaction => "InteractionError",
            Self::PageAgent => "PageAgentError",
            Self::Storage => "StorageError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_http_and_network() {
        let kind = ErrorKind::RateLimit { retry_after: None };
        assert!(kind.belongs_to(ErrorFamily::RateLimit));
        assert!(kind.belongs_to(ErrorFamily::Http));
        assert!(kind.is_network());
        assert!(!kind.is_parsing());
        assert_eq!(kind.status_code(), Some(429));
    }

    #[test]
    fn test_parsing_subkinds() {
        let missing = ErrorKind::ElementNotFound {
            selector: ".review".to_string(),
        };
        let invalid = ErrorKind::InvalidData {
            field_name: "rating".to_string(),
            raw_value: Some("n/a".to_string()),
        };

        assert!(missing.is_parsing());
        assert!(invalid.is_parsing());
        assert!(!missing.belongs_to(ErrorFamily::InvalidData));
    }

    #[test]
    fn test_stale_element_is_resource() {
        assert!(ErrorKind::StaleElement.is_resource());
        assert!(ErrorKind::StaleElement.belongs_to(ErrorFamily::PageAgent));
        assert!(!ErrorKind::StaleElement.is_network());
        assert!(ErrorKind::Storage.is_resource());
    }

    #[test]
    fn test_navigation_subkinds() {
        assert!(ErrorKind::PageNotFound.is_navigation());
        assert!(ErrorKind::InvalidPage {
            requested_page: 7,
            total_pages: 5
        }
        .is_navigation());
        assert!(!ErrorKind::Navigation.belongs_to(ErrorFamily::PageNotFound));
    }

    #[test]
    fn test_any_matches_everything() {
        for kind in [
            ErrorKind::Network,
            ErrorKind::Parsing,
            ErrorKind::Navigation,
            ErrorKind::Storage,
        ] {
            assert!(kind.belongs_to(ErrorFamily::Any));
        }
    }
}

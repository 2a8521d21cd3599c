use super::{CrawlError, ErrorKind};
use std::time::Duration;

/// The level at which a retry decision is being made
///
/// Navigation failures cannot be fixed by re-querying an element, but re-running the
/// whole navigation can succeed, so they are retriable only at operation scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryScope {
    /// A single element lookup or extraction on the current render
    Element,
    /// A whole externally visible operation (e.g. loading the target URL)
    Operation,
}

/// Outcome of classifying a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retriability {
    pub retriable: bool,
    /// Server-imposed wait that overrides computed backoff
    pub forced_delay: Option<Duration>,
}

impl Retriability {
    fn retry() -> Self {
        Self {
            retriable: true,
            forced_delay: None,
        }
    }

    fn retry_after(delay: Option<Duration>) -> Self {
        Self {
            retriable: true,
            forced_delay: delay,
        }
    }

    fn give_up() -> Self {
        Self {
            retriable: false,
            forced_delay: None,
        }
    }
}

/// Decides whether a failure may be retried
///
/// | Kind                          | Retriable                              |
/// |-------------------------------|----------------------------------------|
/// | Network, Timeout              | always                                 |
/// | Http                          | only for status >= 500                 |
/// | RateLimit                     | always, `retry_after` forces the delay |
/// | Navigation, PageNotFound      | only at [`RetryScope::Operation`]      |
/// | InvalidPage                   | never                                  |
/// | Parsing family                | never                                  |
/// | Resource family               | never                                  |
pub fn is_retriable(error: &CrawlError, scope: RetryScope) -> Retriability {
    match error.kind() {
        ErrorKind::RateLimit { retry_after } => Retriability::retry_after(*retry_after),
        ErrorKind::Http { status_code } if *status_code >= 500 => Retriability::retry(),
        ErrorKind::Http { .. } => Retriability::give_up(),
        ErrorKind::Network | ErrorKind::Timeout => Retriability::retry(),
        ErrorKind::Navigation | ErrorKind::PageNotFound if scope == RetryScope::Operation => {
            Retriability::retry()
        }
        ErrorKind::Navigation
        | ErrorKind::PageNotFound
        | ErrorKind::InvalidPage { .. }
        | ErrorKind::Parsing
        | ErrorKind::ElementNotFound { .. }
        | ErrorKind::InvalidData { .. }
        | ErrorKind::Resource
        | ErrorKind::StaleElement
        | ErrorKind::Interaction
        | ErrorKind::PageAgent
        | ErrorKind::Storage => Retriability::give_up(),
    }
}

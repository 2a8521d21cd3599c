/// Crawl session state definitions
///
/// This module defines the states one crawl session moves through.
use std::fmt;

/// Represents the current state of a crawl session
///
/// ```text
/// Idle -> Navigating -> CollectingPage -> (Paginating -> CollectingPage)* -> Done
/// ```
///
/// `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlState {
    // ===== Active States =====
    /// Session created, nothing requested yet
    #[default]
    Idle,

    /// Loading the target URL
    Navigating,

    /// Extracting records from the current page
    CollectingPage,

    /// Moving to the next page
    Paginating,

    // ===== Terminal States =====
    /// Finished, possibly early, with whatever was collected
    Done,

    /// Stopped by an unrecoverable error
    Failed,
}

impl CrawlState {
    /// Returns true if the session can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the session is still running
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the session ended without a fatal error
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;

        if self.is_terminal() {
            return false;
        }

        matches!(
            (self, next),
            (Idle, Navigating)
                | (Navigating, CollectingPage)
                | (CollectingPage, Paginating)
                | (CollectingPage, Done)
                | (Paginating, CollectingPage)
                | (Paginating, Done)
                | (_, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Navigating => "navigating",
            Self::CollectingPage => "collecting_page",
            Self::Paginating => "paginating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible crawl states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Navigating,
            Self::CollectingPage,
            Self::Paginating,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
